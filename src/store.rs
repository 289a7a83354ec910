use crate::storage::{KeyValueStore, WORKOUTS_KEY};
use crate::workout::Workout;
use anyhow::{Context, Result};

/// The workout history, insertion order = creation order.
#[derive(Debug, Default)]
pub struct WorkoutLog {
    workouts: Vec<Workout>,
}

impl WorkoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the log from the persisted slot.
    ///
    /// An absent or unreadable slot never blocks startup: warn and start
    /// with an empty history instead.
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let raw = match storage.get(WORKOUTS_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(err = %e, "could not read stored workouts; starting fresh");
                return Self::new();
            }
        };
        let Some(raw) = raw else {
            return Self::new();
        };
        Self::from_json(&raw).unwrap_or_else(|e| {
            tracing::warn!(err = %e, "stored workouts are unreadable; starting fresh");
            Self::new()
        })
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        Ok(Self {
            workouts: serde_json::from_str(raw)?,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.workouts)
    }

    /// Mirror the whole history into the slot. There is no partial update;
    /// every write replaces the previous serialization.
    pub fn persist(&self, storage: &mut dyn KeyValueStore) -> Result<()> {
        let json = self.to_json().context("Serializing workout history")?;
        storage.set(WORKOUTS_KEY, &json)
    }

    pub fn push(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    /// Linear scan; ids are compared as plain strings.
    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn last(&self) -> Option<&Workout> {
        self.workouts.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workout> {
        self.workouts.iter()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}
