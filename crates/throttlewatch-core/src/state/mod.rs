// # Snapshot State
//
// This module provides the snapshot type produced by every refresh cycle
// and the store that publishes it to readers.

pub mod snapshot;
pub mod store;

pub use snapshot::{RecordMap, ServerInterfaceRecord, Snapshot};
pub use store::SnapshotStore;
