//! Sequential human-readable identifiers for laboratory records.
//!
//! `SequenceAllocator` turns "next identifier for sequence X" into one
//! atomic increment on a `CounterStore` plus formatting:
//!
//! | Sequence | Format |
//! |---|---|
//! | patientId | `PAT-{year}-{n:06}` |
//! | orderNumber | `ORD-{year}-{n:06}` |
//! | reportNumber | `RPT-{year}-{n:06}` |
//! | testCode | `TST-{n:04}` |
//! | sampleId | `SPL-{year}-{n:06}` |
//! | barcode | `SMP-{yyyymmdd}-{n:06}` |
//!
//! The store is injected; `SqliteCounterStore` is the durable
//! implementation and `MemoryCounterStore` the in-process one.

pub mod allocator;
pub mod clock;
pub mod error;
pub mod memory;
pub mod parse;
pub mod random;
pub mod sequence;
pub mod store;

pub use allocator::SequenceAllocator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::IdError;
pub use memory::MemoryCounterStore;
pub use parse::{parse_identifier, ParsedIdentifier};
pub use random::{random_alphanumeric, random_uuid, short_id};
pub use sequence::{DateComponent, Sequence, SequenceFormat};
pub use store::{CounterStore, SqliteCounterStore};
