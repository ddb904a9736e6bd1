//! Read-only query surface over the current snapshot
//!
//! [`QueryService::lookup`] distinguishes three outcomes, which transports
//! are expected to keep apart:
//!
//! - `Ok(record)`: the IP is in the current snapshot
//! - `Err(Error::InvalidInput)`: no IP was given (bad request)
//! - `Err(Error::NotFound)`: the IP is not in the current snapshot
//!
//! Neither operation touches the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::{ServerInterfaceRecord, SnapshotStore};

/// Liveness summary of the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always `"ok"` while the process serves requests
    pub status: String,

    /// Time the report was produced
    pub timestamp: DateTime<Utc>,

    /// Number of IP records in the current snapshot
    pub total_servers: usize,

    /// When the current snapshot was built (`None` before the first cycle)
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Lookup of cached records by IP
#[derive(Debug, Clone)]
pub struct QueryService {
    store: SnapshotStore,
}

impl QueryService {
    /// Create a query service reading from `store`
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    /// Look up the record for an IP
    ///
    /// # Parameters
    ///
    /// - `ip`: The requested IP, as received (`None` if the parameter was absent)
    ///
    /// # Returns
    ///
    /// - `Ok(ServerInterfaceRecord)`: The stored record, verbatim
    /// - `Err(Error::InvalidInput)`: `ip` is missing or empty
    /// - `Err(Error::NotFound)`: No record for `ip` in the current snapshot
    pub async fn lookup(&self, ip: Option<&str>) -> Result<ServerInterfaceRecord> {
        let ip = match ip {
            Some(ip) if !ip.is_empty() => ip,
            _ => return Err(Error::invalid_input("missing ipv4IP parameter")),
        };

        let snapshot = self.store.read().await;
        snapshot
            .get(ip)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no information for IP {}", ip)))
    }

    /// Summarize the current snapshot
    pub async fn health(&self) -> HealthReport {
        let snapshot = self.store.read().await;
        HealthReport {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            total_servers: snapshot.len(),
            last_refresh: snapshot.built_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{RecordMap, Snapshot};

    async fn service_with(records: &[(&str, bool)]) -> QueryService {
        let store = SnapshotStore::new();
        let records: RecordMap = records
            .iter()
            .map(|(ip, throttled)| (ip.to_string(), ServerInterfaceRecord::new(*ip, *throttled)))
            .collect();
        store.replace(Snapshot::new(records)).await;
        QueryService::new(store)
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let service = service_with(&[("10.0.0.1", true)]).await;
        let record = service.lookup(Some("10.0.0.1")).await.unwrap();
        assert_eq!(record, ServerInterfaceRecord::new("10.0.0.1", true));
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let service = service_with(&[("10.0.0.1", true)]).await;
        let err = service.lookup(Some("10.0.0.2")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_missing_parameter() {
        let service = service_with(&[("10.0.0.1", true)]).await;
        assert!(matches!(
            service.lookup(None).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.lookup(Some("")).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_health_before_first_cycle() {
        let service = QueryService::new(SnapshotStore::new());
        let health = service.health().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.total_servers, 0);
        assert!(health.last_refresh.is_none());
    }

    #[tokio::test]
    async fn test_health_counts_records() {
        let service = service_with(&[("10.0.0.1", false), ("10.0.0.2", true)]).await;
        let health = service.health().await;
        assert_eq!(health.total_servers, 2);
        assert!(health.last_refresh.is_some());
    }
}
