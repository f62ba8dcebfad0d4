//! Snapshot cache of the reference graph.
//!
//! A `Snapshot` is built off to the side by one load pass and never mutated
//! afterwards. `SnapshotCache` publishes it by swapping a single `Arc` under
//! a write lock, so readers only ever wait for that swap.

mod cache;
mod snapshot;

pub use cache::{CacheStatus, SnapshotCache};
pub use snapshot::Snapshot;
