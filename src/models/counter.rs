use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Largest value a counter may hold; SQLite stores it as a signed 64-bit integer.
pub const MAX_COUNTER_VALUE: u64 = i64::MAX as u64;

/// Persisted allocation state of one named sequence.
///
/// `value` is the next value to allocate, never the last one handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub name: String,
    pub value: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CounterRecord {
    /// The value consumed by the increment that produced this record.
    ///
    /// `None` when no value has ever been allocated (`value == 1`).
    pub fn last_allocated(&self) -> Option<u64> {
        self.value.checked_sub(1).filter(|v| *v >= 1)
    }
}
