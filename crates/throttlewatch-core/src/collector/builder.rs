//! Snapshot building across all configured accounts

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::account::AccountCollector;
use crate::config::{AccountConfig, ServiceConfig};
use crate::state::{RecordMap, Snapshot};
use crate::traits::ServerClientFactory;

/// Builds a fresh [`Snapshot`] from every configured account
///
/// Accounts are processed sequentially in configuration order and their
/// mappings merged with same-key-overwrite semantics: when two accounts
/// report the same IP, the account listed later wins.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    collector: AccountCollector,
    accounts: Vec<AccountConfig>,
}

impl SnapshotBuilder {
    /// Create a builder
    ///
    /// # Parameters
    ///
    /// - `factory`: Builds a client per account
    /// - `accounts`: Accounts to poll, in merge order
    /// - `call_timeout`: Upper bound for every individual upstream call
    pub fn new(
        factory: Arc<dyn ServerClientFactory>,
        accounts: Vec<AccountConfig>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            collector: AccountCollector::new(factory, call_timeout),
            accounts,
        }
    }

    /// Create a builder from the service configuration
    pub fn from_config(factory: Arc<dyn ServerClientFactory>, config: &ServiceConfig) -> Self {
        Self::new(factory, config.accounts.clone(), config.request_timeout())
    }

    /// Number of configured accounts (complete or not)
    pub fn accounts_count(&self) -> usize {
        self.accounts.len()
    }

    /// Run one collection pass over every account
    ///
    /// Always produces a snapshot; an account that fails entirely simply
    /// contributes no records.
    pub async fn build(&self) -> Snapshot {
        let mut records = RecordMap::new();

        for account in &self.accounts {
            let Some(credentials) = account.credentials() else {
                warn!(
                    "Account {} is missing its login name or password, skipping",
                    account.label()
                );
                continue;
            };

            info!("Collecting servers of account {}", credentials.loginname);
            let account_records = self.collector.collect(&credentials).await;
            records.extend(account_records);
        }

        let snapshot = Snapshot::new(records);
        info!("Snapshot built: {} IP record(s)", snapshot.len());
        if !snapshot.is_empty() {
            debug!("Cached IPs: {:?}", snapshot.ips());
        }

        snapshot
    }
}
