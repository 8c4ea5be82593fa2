//! Snapshot persistence for the blog store.
//!
//! The whole store is written as one checksummed JSON document. Writes go
//! to a temporary file that is synced and then atomically renamed.

pub mod io_utils;
mod persistence_manager;
mod snapshot;

pub use persistence_manager::{PersistenceManager, SNAPSHOT_FILE};
pub use snapshot::{checksum, Snapshot, SnapshotFile, SNAPSHOT_VERSION};
