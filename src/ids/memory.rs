//! In-process counter store.
//!
//! State lives in a mutex-guarded map and is lost on drop. Used by tests
//! and by embedders that do not need durability.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::error::IdError;
use super::store::CounterStore;
use crate::models::{CounterRecord, MAX_COUNTER_VALUE};

#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, CounterRecord>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `(name, value)` pairs, clamped to the valid range.
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let now = Utc::now().naive_utc();
        let counters = values
            .into_iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    CounterRecord {
                        name: name.to_string(),
                        value: value.clamp(1, MAX_COUNTER_VALUE),
                        created_at: now,
                        updated_at: now,
                    },
                )
            })
            .collect();
        Self {
            counters: Mutex::new(counters),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CounterRecord>>, IdError> {
        self.counters
            .lock()
            .map_err(|_| IdError::StoreUnavailable("counter map lock poisoned".into()))
    }
}

fn fresh(name: &str, value: u64) -> CounterRecord {
    let now = Utc::now().naive_utc();
    CounterRecord {
        name: name.to_string(),
        value,
        created_at: now,
        updated_at: now,
    }
}

impl CounterStore for MemoryCounterStore {
    fn upsert_and_get(&self, name: &str) -> Result<CounterRecord, IdError> {
        let mut counters = self.lock()?;
        let record = counters
            .entry(name.to_string())
            .or_insert_with(|| fresh(name, 1));
        Ok(record.clone())
    }

    fn increment_and_fetch(&self, name: &str) -> Result<CounterRecord, IdError> {
        let mut counters = self.lock()?;
        match counters.get_mut(name) {
            Some(record) => {
                if record.value >= MAX_COUNTER_VALUE {
                    return Err(IdError::ValueOutOfRange(format!("counter {name} is exhausted")));
                }
                record.value += 1;
                record.updated_at = Utc::now().naive_utc();
                Ok(record.clone())
            }
            None => {
                let record = fresh(name, 2);
                counters.insert(name.to_string(), record.clone());
                Ok(record)
            }
        }
    }

    fn get(&self, name: &str) -> Result<Option<CounterRecord>, IdError> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn list(&self) -> Result<Vec<CounterRecord>, IdError> {
        let mut records: Vec<CounterRecord> = self.lock()?.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    fn advance_to(&self, name: &str, min_value: u64) -> Result<CounterRecord, IdError> {
        if min_value == 0 || min_value > MAX_COUNTER_VALUE {
            return Err(IdError::ValueOutOfRange(format!(
                "counter {name} cannot be advanced to {min_value}"
            )));
        }
        let mut counters = self.lock()?;
        let record = counters
            .entry(name.to_string())
            .or_insert_with(|| fresh(name, min_value));
        if record.value < min_value {
            record.value = min_value;
            record.updated_at = Utc::now().naive_utc();
        }
        Ok(record.clone())
    }
}
