//! Session state: the registry and the log together with their stores.
//!
//! Every mutating call writes the affected store before returning. If the
//! write fails the in-memory change is undone, so what the UI shows always
//! matches what is on disk.

use std::path::Path;

use crate::chart::{self, ChartSeries};
use crate::error::{StoreError, TrackerError};
use crate::registry::ExerciseRegistry;
use crate::store::JsonStore;
use crate::workouts::{WorkoutLog, WorkoutRecord};

pub const REGISTRY_FILE: &str = "exercise_types.json";
pub const LOG_FILE: &str = "workouts.json";

#[derive(Debug)]
pub struct Tracker {
    registry: ExerciseRegistry,
    log: WorkoutLog,
    registry_store: JsonStore,
    log_store: JsonStore,
}

impl Tracker {
    /// Load both stores from `data_dir`.
    ///
    /// Missing files give the built-in exercise types and an empty log.
    /// Corrupt files are reported and left untouched.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let registry_store = JsonStore::new(data_dir.join(REGISTRY_FILE));
        let log_store = JsonStore::new(data_dir.join(LOG_FILE));
        let registry = ExerciseRegistry::load(&registry_store)?;
        let log = WorkoutLog::load(&log_store)?;
        Ok(Self {
            registry,
            log,
            registry_store,
            log_store,
        })
    }

    pub fn registry(&self) -> &ExerciseRegistry {
        &self.registry
    }

    pub fn log(&self) -> &WorkoutLog {
        &self.log
    }

    /// Validate the main form inputs and append the resulting record.
    pub fn submit_workout(
        &mut self,
        exercise_type: &str,
        amount: &str,
        date: &str,
    ) -> Result<WorkoutRecord, TrackerError> {
        let record = WorkoutRecord::from_form(&self.registry, exercise_type, amount, date)?;
        self.update_log(|log| {
            log.append(record.clone());
            Ok(())
        })?;
        log::info!("Added workout:{}", record.display_line());
        Ok(record)
    }

    pub fn list_workouts(&self) -> Vec<String> {
        self.log.display_lines()
    }

    pub fn delete_workout(&mut self, position: usize) -> Result<WorkoutRecord, TrackerError> {
        let removed = self.update_log(|log| log.remove_at(position))?;
        log::info!("Removed workout:{}", removed.display_line());
        Ok(removed)
    }

    pub fn list_exercise_types(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn add_exercise_type(&mut self, name: &str, unit: &str) -> Result<(), TrackerError> {
        self.update_registry(|reg| reg.add(name, unit))?;
        log::info!("Saved exercise type {name} ({unit})");
        Ok(())
    }

    /// Remove an exercise type. Returns `false`, without touching the store,
    /// when no such type exists.
    pub fn remove_exercise_type(&mut self, name: &str) -> Result<bool, TrackerError> {
        if !self.registry.contains(name) {
            return Ok(false);
        }
        self.update_registry(|reg| Ok(reg.remove(name)))?;
        log::info!("Removed exercise type {name}");
        Ok(true)
    }

    pub fn rename_exercise_type(
        &mut self,
        old_name: &str,
        new_name: &str,
        new_unit: &str,
    ) -> Result<(), TrackerError> {
        self.update_registry(|reg| reg.rename(old_name, new_name, new_unit))?;
        log::info!("Renamed exercise type {old_name} to {new_name} ({new_unit})");
        Ok(())
    }

    pub fn chart_series(&self, exercise_type: &str) -> ChartSeries {
        chart::series_for(self.log.records(), exercise_type)
    }

    fn update_log<R>(
        &mut self,
        change: impl FnOnce(&mut WorkoutLog) -> Result<R, TrackerError>,
    ) -> Result<R, TrackerError> {
        let before = self.log.clone();
        let out = change(&mut self.log)?;
        if let Err(e) = self.log.save(&self.log_store) {
            log::error!("{e}");
            self.log = before;
            return Err(e.into());
        }
        Ok(out)
    }

    fn update_registry<R>(
        &mut self,
        change: impl FnOnce(&mut ExerciseRegistry) -> Result<R, TrackerError>,
    ) -> Result<R, TrackerError> {
        let before = self.registry.clone();
        let out = change(&mut self.registry)?;
        if let Err(e) = self.registry.save(&self.registry_store) {
            log::error!("{e}");
            self.registry = before;
            return Err(e.into());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workouts::{NO_DATE, UNKNOWN_AMOUNT};

    fn reopen(dir: &Path) -> Tracker {
        Tracker::open(dir).unwrap()
    }

    #[test]
    fn fresh_directory_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let t = reopen(dir.path());
        assert_eq!(t.list_exercise_types(), vec!["Running", "Pushups"]);
        assert!(t.list_workouts().is_empty());
        // nothing is written until the first change
        assert!(!dir.path().join(REGISTRY_FILE).exists());
        assert!(!dir.path().join(LOG_FILE).exists());
    }

    #[test]
    fn submit_persists_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        let r = t.submit_workout("Running", "3", "2024-01-01").unwrap();
        assert_eq!(
            t.list_workouts().last().map(String::as_str),
            Some(" 2024-01-01 - Running - 3 minutes")
        );
        assert_eq!(r.display_line(), " 2024-01-01 - Running - 3 minutes");
        assert_eq!(reopen(dir.path()).log().records(), &[r]);
    }

    #[test]
    fn submit_placeholders_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        let err = t.submit_workout("", "5", "2024-01-01").unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert!(t.log().is_empty());
        assert!(!dir.path().join(LOG_FILE).exists());

        let r = t.submit_workout("Running", "", "").unwrap();
        assert_eq!(r.amount, UNKNOWN_AMOUNT);
        assert_eq!(r.date, NO_DATE);
    }

    #[test]
    fn delete_persists_and_rejects_stale_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        t.submit_workout("Running", "3", "2024-01-01").unwrap();
        t.submit_workout("Pushups", "20", "2024-01-01").unwrap();

        let removed = t.delete_workout(0).unwrap();
        assert_eq!(removed.exercise_type, "Running");
        assert_eq!(reopen(dir.path()).log().len(), 1);

        let err = t.delete_workout(5).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::IndexOutOfRange { index: 5, len: 1 }
        ));
        assert_eq!(t.log().len(), 1);
    }

    #[test]
    fn exercise_type_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        t.add_exercise_type("Yoga", "minutes").unwrap();
        assert!(t.list_exercise_types().contains(&"Yoga".to_string()));
        assert!(reopen(dir.path()).registry().contains("Yoga"));

        assert!(t.remove_exercise_type("Yoga").unwrap());
        assert!(!t.registry().contains("Yoga"));
        assert!(!reopen(dir.path()).registry().contains("Yoga"));

        assert!(!t.remove_exercise_type("Yoga").unwrap());
    }

    #[test]
    fn rename_persists_and_keeps_old_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        t.submit_workout("Running", "3", "2024-01-01").unwrap();
        t.rename_exercise_type("Running", "Jogging", "miles").unwrap();

        let again = reopen(dir.path());
        assert_eq!(again.list_exercise_types(), vec!["Jogging", "Pushups"]);
        assert_eq!(again.log().records()[0].exercise_type, "Running");
        assert_eq!(again.log().records()[0].unit, "minutes");
    }

    #[test]
    fn corrupt_store_fails_open_and_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE);
        std::fs::write(&path, "[{]").unwrap();
        let err = Tracker::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{]");
    }

    #[test]
    fn failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        t.submit_workout("Running", "3", "2024-01-01").unwrap();

        // a directory sitting on the temp path makes every save fail
        std::fs::create_dir(dir.path().join(format!("{LOG_FILE}.tmp"))).unwrap();
        std::fs::create_dir(dir.path().join(format!("{REGISTRY_FILE}.tmp"))).unwrap();

        let err = t.submit_workout("Pushups", "10", "2024-01-02").unwrap_err();
        assert!(matches!(err, TrackerError::Store(StoreError::Write { .. })));
        assert_eq!(t.log().len(), 1);
        assert_eq!(t.list_workouts().len(), 1);

        let err = t.add_exercise_type("Yoga", "minutes").unwrap_err();
        assert!(matches!(err, TrackerError::Store(StoreError::Write { .. })));
        assert!(!t.registry().contains("Yoga"));
        assert!(t.delete_workout(0).is_err());
        assert_eq!(t.log().len(), 1);

        let again = reopen(dir.path());
        assert_eq!(again.log().len(), 1);
        assert!(!again.registry().contains("Yoga"));
    }

    #[test]
    fn chart_uses_current_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = reopen(dir.path());
        t.submit_workout("Running", "5", "2024-01-02").unwrap();
        t.submit_workout("Running", "3", "2024-01-01").unwrap();
        t.submit_workout("Pushups", "20", "2024-01-01").unwrap();
        let s = t.chart_series("Running");
        let amounts: Vec<f64> = s.points.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![3.0, 5.0]);
    }
}
