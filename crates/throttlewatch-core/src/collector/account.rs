//! Per-account collection
//!
//! The [`AccountCollector`] turns one account's servers into a flat
//! IP -> record mapping. Every failure is scoped as narrowly as possible:
//!
//! | failure                          | effect                          |
//! |----------------------------------|---------------------------------|
//! | client construction / listing    | account contributes nothing     |
//! | server info request              | that server is skipped          |
//! | malformed first interface        | that server is skipped          |
//!
//! Nothing is propagated to the caller; failures are only logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::state::{RecordMap, ServerInterfaceRecord};
use crate::traits::{ServerClient, ServerClientFactory};

/// Collects the records of a single account
#[derive(Clone)]
pub struct AccountCollector {
    factory: Arc<dyn ServerClientFactory>,
    call_timeout: Duration,
}

impl AccountCollector {
    /// Create a collector
    ///
    /// # Parameters
    ///
    /// - `factory`: Builds a client bound to an account's credentials
    /// - `call_timeout`: Upper bound for every individual upstream call
    pub fn new(factory: Arc<dyn ServerClientFactory>, call_timeout: Duration) -> Self {
        Self {
            factory,
            call_timeout,
        }
    }

    /// Collect every IP record of one account
    ///
    /// Only the first interface of each server is consulted. Within the
    /// account, a later server reporting the same IP overwrites an earlier
    /// one.
    pub async fn collect(&self, credentials: &Credentials) -> RecordMap {
        let mut records = RecordMap::new();
        let account = credentials.loginname.as_str();

        let client = match self.factory.create(credentials) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create client for account {}: {}", account, e);
                return records;
            }
        };

        let servers = match self.bounded(client.list_servers()).await {
            Ok(servers) => servers,
            Err(e) => {
                error!("Failed to list servers of account {}: {}", account, e);
                return records;
            }
        };
        info!("Account {} has {} server(s)", account, servers.len());

        for server in &servers {
            self.collect_server(client.as_ref(), server, &mut records)
                .await;
        }

        records
    }

    async fn collect_server(&self, client: &dyn ServerClient, server: &str, records: &mut RecordMap) {
        let info = match self.bounded(client.server_info(server)).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to fetch information for server {}: {}", server, e);
                return;
            }
        };

        let Some(first) = info.interfaces.into_iter().next() else {
            debug!("Server {} reports no interfaces", server);
            return;
        };

        let interface = match first {
            Ok(interface) => interface,
            Err(malformed) => {
                error!(
                    "Failed to read the first interface of server {}: {}",
                    server, malformed.reason
                );
                debug!("Interface fields present: {:?}", malformed.fields);
                return;
            }
        };

        let throttled = interface.throttled();
        for ip in interface.addresses() {
            debug!("Collected {} -> trafficThrottled: {}", ip, throttled);
            records.insert(ip.clone(), ServerInterfaceRecord::new(ip, throttled));
        }
    }

    /// Apply the per-call time bound to an upstream call
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.call_timeout)),
        }
    }
}

impl std::fmt::Debug for AccountCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCollector")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
