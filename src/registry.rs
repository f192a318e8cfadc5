//! Known exercise types and the unit each one is measured in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, TrackerError};
use crate::store::JsonStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseType {
    pub name: String,
    pub unit: String,
}

impl ExerciseType {
    /// Label used in the exercise type editor, e.g. `Running (minutes)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.unit)
    }
}

/// Insertion-ordered mapping of exercise type name to unit.
///
/// Stored on disk as a JSON object `{ "<name>": "<unit>", ... }` whose key
/// order follows the registry order. Names are matched with surrounding
/// whitespace ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseRegistry {
    types: IndexMap<String, String>,
}

impl Default for ExerciseRegistry {
    fn default() -> Self {
        let mut types = IndexMap::new();
        types.insert("Running".to_string(), "minutes".to_string());
        types.insert("Pushups".to_string(), "repetitions".to_string());
        Self { types }
    }
}

impl ExerciseRegistry {
    pub fn empty() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Load the registry, falling back to the built-in types when the store
    /// file does not exist yet.
    pub fn load(store: &JsonStore) -> Result<Self, StoreError> {
        let registry = store.load::<Self>()?.unwrap_or_default();
        log::info!(
            "Loaded {} exercise types from {}",
            registry.len(),
            store.path().display()
        );
        Ok(registry)
    }

    pub fn save(&self, store: &JsonStore) -> Result<(), StoreError> {
        store.save(self)
    }

    /// Insert a type, or overwrite the unit of an existing one in place.
    pub fn add(&mut self, name: &str, unit: &str) -> Result<(), TrackerError> {
        let name = checked_name(name)?;
        self.types.insert(name.to_string(), unit.to_string());
        Ok(())
    }

    /// Remove a type by name. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.types.shift_remove(name.trim()).is_some()
    }

    /// Rename a type and/or change its unit.
    ///
    /// The entry keeps its position. If `new_name` already names a different
    /// entry, that entry is dropped. When `old_name` is unknown this behaves
    /// like [`ExerciseRegistry::add`].
    pub fn rename(
        &mut self,
        old_name: &str,
        new_name: &str,
        new_unit: &str,
    ) -> Result<(), TrackerError> {
        let new_name = checked_name(new_name)?;
        let old_name = old_name.trim();
        let Some(mut idx) = self.types.get_index_of(old_name) else {
            return self.add(new_name, new_unit);
        };
        if new_name != old_name {
            if let Some((dup, _, _)) = self.types.shift_remove_full(new_name) {
                if dup < idx {
                    idx -= 1;
                }
            }
        }
        self.types.shift_remove_index(idx);
        self.types
            .shift_insert(idx, new_name.to_string(), new_unit.to_string());
        Ok(())
    }

    pub fn unit_for(&self, name: &str) -> Option<&str> {
        self.types.get(name.trim()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name.trim())
    }

    pub fn names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = ExerciseType> + '_ {
        self.types.iter().map(|(name, unit)| ExerciseType {
            name: name.clone(),
            unit: unit.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn checked_name(name: &str) -> Result<&str, TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::Validation(
            "Exercise type name must not be empty.".into(),
        ));
    }
    Ok(name)
}
