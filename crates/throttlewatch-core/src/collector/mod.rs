//! Collection of upstream server state
//!
//! - [`AccountCollector`]: one account -> IP records
//! - [`SnapshotBuilder`]: every configured account -> one [`Snapshot`](crate::state::Snapshot)

pub mod account;
pub mod builder;

pub use account::AccountCollector;
pub use builder::SnapshotBuilder;
