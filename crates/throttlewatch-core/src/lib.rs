// # throttlewatch-core
//
// Core library of the throttlewatch service: a background-refreshed lookup
// table of per-IP traffic throttle flags collected from upstream accounts.
//
// ## Architecture Overview
//
// - **ServerClient**: Trait for the upstream account API (list servers, read interfaces)
// - **AccountCollector**: One account -> flat IP -> record mapping
// - **SnapshotBuilder**: All configured accounts -> one immutable Snapshot
// - **RefreshScheduler**: Rebuilds the snapshot on an interval, backs off after failures
// - **SnapshotStore**: Atomic replace/read cell shared by the scheduler and readers
// - **QueryService**: Lookup by IP and a health summary
//
// ## Design Principles
//
// 1. **Narrowest failure scope**: A failing server or account never costs the whole cycle
// 2. **Whole-snapshot swaps**: Readers see the old or the new snapshot, never a mix
// 3. **Explicit ownership**: The store is a handle injected where needed, not a global
// 4. **Cancellable**: The refresh loop stops on a shutdown signal
// 5. **Library-First**: The daemon is a thin layer over this crate

pub mod collector;
pub mod config;
pub mod error;
pub mod query;
pub mod scheduler;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use collector::{AccountCollector, SnapshotBuilder};
pub use config::{AccountConfig, Credentials, ServiceConfig};
pub use error::{Error, Result};
pub use query::{HealthReport, QueryService};
pub use scheduler::{RefreshScheduler, SchedulerEvent};
pub use state::{RecordMap, ServerInterfaceRecord, Snapshot, SnapshotStore};
pub use traits::{ServerClient, ServerClientFactory, ServerInfo, ServerInterface};
