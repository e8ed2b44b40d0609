//! Concurrency tests for the identifier allocator over a shared counter file.
//!
//! Each worker opens its own `SqliteCounterStore`, the same way separate
//! request handlers or separate processes would.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use lis_ids::ids::{parse_identifier, CounterStore, FixedClock, SqliteCounterStore};
use lis_ids::{Sequence, SequenceAllocator};
use tempfile::TempDir;

fn create_counter_db() -> (PathBuf, Arc<SqliteCounterStore>, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("counters.db");
    let store = Arc::new(SqliteCounterStore::open(&path).unwrap());
    (path, store, dir)
}

fn allocator_for(path: &Path) -> SequenceAllocator {
    let store = SqliteCounterStore::open(path).unwrap();
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap());
    SequenceAllocator::with_clock(Arc::new(store), Arc::new(clock))
}

// =============================================================================
// Uniqueness
// =============================================================================

/// Separate connections on one file never hand out the same identifier.
#[test]
fn parallel_connections_no_duplicate_identifiers() {
    let (path, store, _dir) = create_counter_db();
    let num_workers = 10;
    let ids_per_worker = 30;

    let handles: Vec<_> = (0..num_workers)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let alloc = allocator_for(&path);
                (0..ids_per_worker)
                    .map(|_| alloc.generate_sample_id().expect("allocation should succeed"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(
        unique.len(),
        ids.len(),
        "Found duplicate identifiers across connections"
    );
    assert_eq!(ids.len(), num_workers * ids_per_worker);

    let mut values: Vec<u64> = ids
        .iter()
        .map(|id| parse_identifier(id).unwrap().value)
        .collect();
    values.sort_unstable();
    let expected: Vec<u64> = (1..=(num_workers * ids_per_worker) as u64).collect();
    assert_eq!(values, expected);

    let stored = store.get(Sequence::SampleId.as_str()).unwrap().unwrap();
    assert_eq!(stored.value, (num_workers * ids_per_worker) as u64 + 1);
}

/// Workers on different sequences leave each other's counters untouched.
#[test]
fn parallel_sequences_are_isolated() {
    let (path, store, _dir) = create_counter_db();
    let per_sequence = 40;
    let sequences = [
        Sequence::PatientId,
        Sequence::OrderNumber,
        Sequence::TestCode,
        Sequence::Barcode,
    ];

    let handles: Vec<_> = sequences
        .iter()
        .map(|&sequence| {
            let path = path.clone();
            thread::spawn(move || {
                let alloc = allocator_for(&path);
                for _ in 0..per_sequence {
                    alloc.next(sequence).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for sequence in sequences {
        let record = store.get(sequence.as_str()).unwrap().unwrap();
        assert_eq!(record.value, per_sequence + 1, "{sequence} drifted");
    }
    assert!(store.get(Sequence::ReportNumber.as_str()).unwrap().is_none());
}

// =============================================================================
// Durability
// =============================================================================

/// Allocation state survives closing every connection.
#[test]
fn allocation_resumes_after_reopen() {
    let (path, store, _dir) = create_counter_db();
    {
        let alloc = allocator_for(&path);
        assert_eq!(alloc.generate_barcode().unwrap(), "SMP-20250305-000001");
        assert_eq!(alloc.generate_barcode().unwrap(), "SMP-20250305-000002");
    }
    drop(store);

    let alloc = allocator_for(&path);
    assert_eq!(alloc.generate_barcode().unwrap(), "SMP-20250305-000003");
}
