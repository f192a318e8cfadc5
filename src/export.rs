use crate::workouts::WorkoutRecord;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(std::io::Error::other)
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_workouts_csv<P: AsRef<Path>>(path: P, records: &[WorkoutRecord]) -> csv::Result<()> {
    write_csv(std::fs::File::create(path)?, records)
}

pub fn save_workouts_json<P: AsRef<Path>>(
    path: P,
    records: &[WorkoutRecord],
) -> std::io::Result<()> {
    write_json(records, path)
}
