//! Sequential identifier allocation.
//!
//! Each call performs exactly one atomic `increment_and_fetch` on the
//! injected store and formats the consumed value. The increment is the
//! only source of truth for the allocated number: there is no earlier
//! read whose value could be shared with a concurrent caller.
//!
//! Failed store calls propagate. An identifier is returned only after the
//! store has confirmed the write. Values lost to a caller-side timeout
//! after commit stay consumed, so sequences may contain gaps but never
//! repeats.

use std::str::FromStr;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::error::IdError;
use super::sequence::Sequence;
use super::store::CounterStore;
use crate::models::CounterRecord;

#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Allocate and format the next identifier of `sequence`.
    pub fn next(&self, sequence: Sequence) -> Result<String, IdError> {
        let value = self.allocate(sequence)?;
        Ok(sequence.format().render(value, self.clock.now()))
    }

    /// Generic form keyed by counter name (`"patientId"`, `"barcode"`, ...).
    ///
    /// Unknown names fail before the store is touched.
    pub fn next_id(&self, name: &str) -> Result<String, IdError> {
        let sequence = Sequence::from_str(name)?;
        self.next(sequence)
    }

    /// `next` on tokio's blocking pool.
    ///
    /// Dropping the returned future does not cancel the store write; a
    /// committed value whose result is never observed becomes a gap.
    pub async fn next_async(&self, sequence: Sequence) -> Result<String, IdError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.next(sequence))
            .await
            .map_err(|e| IdError::StoreUnavailable(format!("allocation task failed: {e}")))?
    }

    pub fn generate_patient_id(&self) -> Result<String, IdError> {
        self.next(Sequence::PatientId)
    }

    pub fn generate_order_number(&self) -> Result<String, IdError> {
        self.next(Sequence::OrderNumber)
    }

    pub fn generate_report_number(&self) -> Result<String, IdError> {
        self.next(Sequence::ReportNumber)
    }

    pub fn generate_test_code(&self) -> Result<String, IdError> {
        self.next(Sequence::TestCode)
    }

    pub fn generate_sample_id(&self) -> Result<String, IdError> {
        self.next(Sequence::SampleId)
    }

    pub fn generate_barcode(&self) -> Result<String, IdError> {
        self.next(Sequence::Barcode)
    }

    /// Value the next allocation of `sequence` will consume.
    ///
    /// Creates the counter when absent but never advances it. Concurrent
    /// allocations may consume this value before the caller does.
    pub fn peek(&self, sequence: Sequence) -> Result<u64, IdError> {
        Ok(self.store.upsert_and_get(sequence.as_str())?.value)
    }

    /// Every counter record in the store.
    pub fn counters(&self) -> Result<Vec<CounterRecord>, IdError> {
        self.store.list()
    }

    /// Raise `sequence` so its next allocation is at least `min_value`.
    ///
    /// Used when importing records numbered by another system.
    pub fn advance_to(&self, sequence: Sequence, min_value: u64) -> Result<CounterRecord, IdError> {
        let record = self.store.advance_to(sequence.as_str(), min_value)?;
        tracing::info!(
            sequence = %sequence,
            requested = min_value,
            value = record.value,
            "Counter advanced"
        );
        Ok(record)
    }

    fn allocate(&self, sequence: Sequence) -> Result<u64, IdError> {
        let record = self
            .store
            .increment_and_fetch(sequence.as_str())
            .inspect_err(|e| {
                tracing::warn!(sequence = %sequence, error = %e, "Identifier allocation failed");
            })?;

        let value = record.last_allocated().ok_or_else(|| {
            IdError::ValueOutOfRange(format!(
                "counter {} returned {} after increment",
                record.name, record.value
            ))
        })?;

        if value == 1 {
            tracing::info!(sequence = %sequence, "Counter initialized on first allocation");
        }
        tracing::debug!(sequence = %sequence, value, "Allocated sequence value");
        Ok(value)
    }
}
