//! Repository layer: counter-scoped database operations.
//!
//! Free functions over a borrowed `Connection`; callers own connection
//! lifetime and locking.

mod counter;

pub use counter::*;
