//! Refresh scheduler
//!
//! The RefreshScheduler is responsible for:
//! - Building one snapshot immediately at startup
//! - Rebuilding it on a fixed interval
//! - Installing every completed snapshot into the SnapshotStore
//! - Backing off to a shorter recovery interval after a failed cycle
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   build()   ┌──────────────────┐
//! │ RefreshScheduler │────────────▶│ SnapshotBuilder  │──▶ ServerClient(s)
//! └──────────────────┘             └──────────────────┘
//!          │ replace()
//!          ▼
//! ┌──────────────────┐   read()    ┌──────────────────┐
//! │  SnapshotStore   │◀────────────│   QueryService   │
//! └──────────────────┘             └──────────────────┘
//! ```
//!
//! ## State Machine
//!
//! ```text
//! STARTING ──build──▶ RUNNING(interval) ──failed cycle──▶ RUNNING(retry_interval)
//!                          ▲                                     │
//!                          └────────────successful cycle─────────┘
//! ```
//!
//! Per-account failures never reach the scheduler; they are absorbed by the
//! builder. A cycle only fails when the build itself is aborted (a panic in
//! collection code). The previous snapshot stays installed in that case.

use crate::collector::SnapshotBuilder;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::state::{Snapshot, SnapshotStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default capacity of the scheduler event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the RefreshScheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler started
    Started {
        accounts_count: usize,
    },

    /// A snapshot was built and installed
    CycleCompleted {
        records: usize,
    },

    /// A cycle was aborted; the previous snapshot stays installed
    CycleFailed {
        error: String,
    },

    /// Scheduler stopped
    Stopped {
        reason: String,
    },
}

/// Background driver of the refresh cycle
///
/// ## Lifecycle
///
/// 1. Create with [`RefreshScheduler::new()`]
/// 2. Start with [`RefreshScheduler::run()`] (or [`RefreshScheduler::spawn()`])
/// 3. Send `true` on the shutdown channel (or drop its sender) to stop
///
/// ## Threading
///
/// The loop is strictly sequential: wait, build, install, repeat. It never
/// runs two builds at once, so it is the only writer of its store.
pub struct RefreshScheduler {
    /// Builds each new snapshot
    builder: Arc<SnapshotBuilder>,

    /// Receives each completed snapshot
    store: SnapshotStore,

    /// Wait between two successful cycles
    interval: Duration,

    /// Wait after a failed cycle
    retry_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl RefreshScheduler {
    /// Create a new scheduler
    ///
    /// # Parameters
    ///
    /// - `builder`: Snapshot builder over the configured accounts
    /// - `store`: Store the snapshots are installed into
    /// - `interval`: Normal wait between cycles
    /// - `retry_interval`: Wait after a failed cycle
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields scheduler events
    pub fn new(
        builder: SnapshotBuilder,
        store: SnapshotStore,
        interval: Duration,
        retry_interval: Duration,
    ) -> (Self, mpsc::Receiver<SchedulerEvent>) {
        let (tx, rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);

        let scheduler = Self {
            builder: Arc::new(builder),
            store,
            interval,
            retry_interval,
            event_tx: tx,
        };

        (scheduler, rx)
    }

    /// Create a scheduler using the intervals of the service configuration
    pub fn from_config(
        builder: SnapshotBuilder,
        store: SnapshotStore,
        config: &ServiceConfig,
    ) -> (Self, mpsc::Receiver<SchedulerEvent>) {
        Self::new(
            builder,
            store,
            config.refresh_interval(),
            config.retry_interval(),
        )
    }

    /// Run the refresh loop until shutdown is requested
    ///
    /// Shutdown is requested by sending `true` on the channel or by dropping
    /// its sender. A pending wait or an in-flight build is abandoned
    /// immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        self.emit_event(SchedulerEvent::Started {
            accounts_count: self.builder.accounts_count(),
        });
        info!(
            "Refresh scheduler started ({} account(s), interval {:?}, retry interval {:?})",
            self.builder.accounts_count(),
            self.interval,
            self.retry_interval
        );

        // The first build happens immediately
        let mut delay = Duration::ZERO;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            let outcome = tokio::select! {
                outcome = self.refresh_once() => outcome,
                _ = shutdown_requested(&mut shutdown) => break,
            };

            delay = match outcome {
                Ok(_) => self.interval,
                Err(e) => {
                    error!("Refresh cycle failed: {}", e);
                    warn!("Retrying in {:?}", self.retry_interval);
                    self.retry_interval
                }
            };
        }

        info!("Shutdown signal received, refresh scheduler stopped");
        self.emit_event(SchedulerEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
    }

    /// Spawn the refresh loop on its own task
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Perform a single cycle: build a snapshot and install it
    ///
    /// The build runs on a separate task so that a panic in collection code
    /// fails only this cycle. The task is aborted if this future is dropped.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of records in the installed snapshot
    /// - `Err(Error)`: The build was aborted; the store is unchanged
    pub async fn refresh_once(&self) -> Result<usize> {
        let builder = Arc::clone(&self.builder);
        let mut build = AbortOnDrop(tokio::spawn(async move { builder.build().await }));

        let snapshot = match (&mut build.0).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let error = Error::cycle(format!("snapshot build aborted: {}", e));
                self.emit_event(SchedulerEvent::CycleFailed {
                    error: error.to_string(),
                });
                return Err(error);
            }
        };

        let records = snapshot.len();
        self.store.replace(snapshot).await;
        info!("Cache updated: {} IP record(s)", records);
        self.emit_event(SchedulerEvent::CycleCompleted { records });

        Ok(records)
    }

    /// Emit a scheduler event
    fn emit_event(&self, event: SchedulerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping scheduler event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("No event receiver, scheduler event discarded");
            }
        }
    }
}

/// Resolves once shutdown is requested or the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Aborts the build task when the cycle is abandoned
struct AbortOnDrop(JoinHandle<Snapshot>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
