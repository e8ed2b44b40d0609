pub mod config;
pub mod db;
pub mod ids; // Sequential identifier allocator
pub mod models;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

pub use ids::{IdError, Sequence, SequenceAllocator};

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to the crate default.
/// A subscriber already installed by the host process is left in place.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    if result.is_ok() {
        tracing::info!("{} identifier allocator v{}", config::APP_NAME, config::APP_VERSION);
    }
}

/// Allocator over the SQLite counter store at the configured location.
pub fn open_default_allocator() -> Result<SequenceAllocator, IdError> {
    let store = ids::SqliteCounterStore::open_default()?;
    Ok(SequenceAllocator::new(Arc::new(store)))
}
