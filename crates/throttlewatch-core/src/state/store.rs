// # Snapshot Store
//
// In-memory holder of the current snapshot.
//
// ## Purpose
//
// The store is the single point of synchronization between the refresh
// scheduler (the only writer) and any number of concurrent query readers.
//
// ## Atomicity
//
// The cell holds an `Arc<Snapshot>`. A replacement is built completely
// before `replace()` is called, and `replace()` only swaps the pointer
// under the write lock. Readers clone the pointer under the read lock and
// release it immediately, so a reader observes either the whole old
// snapshot or the whole new one, and no lock is ever held across network
// calls.
//
// ## Crash Behavior
//
// - State is lost on restart (the first cycle after startup rebuilds it)

use std::sync::Arc;
use tokio::sync::RwLock;

use super::snapshot::Snapshot;

/// Shared handle to the current snapshot
///
/// Cloning the handle is cheap; all clones see the same cell. Construct one
/// at startup and inject it into both the scheduler and the query service.
///
/// # Example
///
/// ```rust,no_run
/// use throttlewatch_core::state::{RecordMap, Snapshot, SnapshotStore};
///
/// #[tokio::main]
/// async fn main() {
///     let store = SnapshotStore::new();
///     assert!(store.read().await.is_empty());
///
///     store.replace(Snapshot::new(RecordMap::new())).await;
///     assert!(store.read().await.built_at().is_some());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// Create a store holding the empty snapshot
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(Snapshot::empty()))),
        }
    }

    /// Install a new snapshot, discarding the previous one
    pub async fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.inner.write().await;
        *guard = snapshot;
    }

    /// Get the current snapshot
    pub async fn read(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.inner.read().await)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
