use serde::{Deserialize, Serialize};

use crate::error::{StoreError, TrackerError};
use crate::registry::ExerciseRegistry;
use crate::store::JsonStore;

/// Stored in place of an amount the user left blank.
pub const UNKNOWN_AMOUNT: &str = "Unknown";
/// Stored in place of a date the user left blank.
pub const NO_DATE: &str = "No date set";
/// Unit used when the exercise type is missing from the registry.
pub const FALLBACK_UNIT: &str = "amount";

/// One logged workout.
///
/// All fields are plain strings copied at creation time; `amount` and `date`
/// are interpreted only when charting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: String,
    pub exercise_type: String,
    pub amount: String,
    pub unit: String,
}

impl WorkoutRecord {
    /// Build a record from the main form inputs.
    ///
    /// Fails only when no exercise type was selected. Blank amount and date
    /// are replaced by [`UNKNOWN_AMOUNT`] and [`NO_DATE`].
    pub fn from_form(
        registry: &ExerciseRegistry,
        exercise_type: &str,
        amount: &str,
        date: &str,
    ) -> Result<Self, TrackerError> {
        let exercise_type = exercise_type.trim();
        if exercise_type.is_empty() {
            return Err(TrackerError::Validation(
                "Please select a workout type.".into(),
            ));
        }
        let unit = registry.unit_for(exercise_type).unwrap_or(FALLBACK_UNIT);
        Ok(Self {
            date: or_placeholder(date, NO_DATE),
            exercise_type: exercise_type.to_string(),
            amount: or_placeholder(amount, UNKNOWN_AMOUNT),
            unit: unit.to_string(),
        })
    }

    /// Line shown in the workout list: ` {date} - {type} - {amount} {unit}`.
    pub fn display_line(&self) -> String {
        format!(
            " {} - {} - {} {}",
            self.date, self.exercise_type, self.amount, self.unit
        )
    }
}

fn or_placeholder(input: &str, placeholder: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        placeholder.to_string()
    } else {
        input.to_string()
    }
}

/// Insertion-ordered list of workouts; display order equals storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutLog {
    records: Vec<WorkoutRecord>,
}

impl WorkoutLog {
    #[cfg(test)]
    pub fn new(records: Vec<WorkoutRecord>) -> Self {
        Self { records }
    }

    /// Load the log; a missing store file yields an empty log.
    pub fn load(store: &JsonStore) -> Result<Self, StoreError> {
        let log = store.load::<Self>()?.unwrap_or_default();
        log::info!(
            "Loaded {} workouts from {}",
            log.len(),
            store.path().display()
        );
        Ok(log)
    }

    pub fn save(&self, store: &JsonStore) -> Result<(), StoreError> {
        store.save(self)
    }

    pub fn append(&mut self, record: WorkoutRecord) {
        self.records.push(record);
    }

    pub fn remove_at(&mut self, index: usize) -> Result<WorkoutRecord, TrackerError> {
        if index >= self.records.len() {
            return Err(TrackerError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn display_lines(&self) -> Vec<String> {
        self.records.iter().map(WorkoutRecord::display_line).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
