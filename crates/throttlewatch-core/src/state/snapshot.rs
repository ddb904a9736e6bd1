// # Snapshot
//
// The complete, immutable result of one refresh cycle, keyed by IP.
//
// A snapshot is built off to the side by the `SnapshotBuilder` and only
// then handed to the `SnapshotStore`. Nothing mutates a snapshot once it
// is constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from IP string to its record
pub type RecordMap = HashMap<String, ServerInterfaceRecord>;

/// Throttle state of one IPv4 address
///
/// Serialized with the field names existing callers already parse:
/// `{"ipv4IP": "10.0.0.1", "trafficThrottled": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInterfaceRecord {
    /// The address (duplicate of the map key)
    #[serde(rename = "ipv4IP")]
    pub ip: String,

    /// Whether traffic shaping is active for the address
    #[serde(rename = "trafficThrottled")]
    pub throttled: bool,
}

impl ServerInterfaceRecord {
    /// Create a new record
    pub fn new(ip: impl Into<String>, throttled: bool) -> Self {
        Self {
            ip: ip.into(),
            throttled,
        }
    }
}

/// Immutable lookup table produced by one refresh cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: RecordMap,
    built_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The snapshot installed before the first cycle completes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seal a freshly collected mapping, stamped with the current time
    pub fn new(records: RecordMap) -> Self {
        Self {
            records,
            built_at: Some(Utc::now()),
        }
    }

    /// Look up the record for an IP
    pub fn get(&self, ip: &str) -> Option<&ServerInterfaceRecord> {
        self.records.get(ip)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the snapshot holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the snapshot was built (`None` for the initial empty snapshot)
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// All cached IPs, sorted
    pub fn ips(&self) -> Vec<&str> {
        let mut ips: Vec<&str> = self.records.keys().map(String::as_str).collect();
        ips.sort_unstable();
        ips
    }

    /// Iterate over all records
    pub fn records(&self) -> impl Iterator<Item = &ServerInterfaceRecord> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_no_timestamp() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.built_at().is_none());
    }

    #[test]
    fn test_record_wire_format() {
        let record = ServerInterfaceRecord::new("10.0.0.1", true);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ipv4IP": "10.0.0.1", "trafficThrottled": true})
        );
    }

    #[test]
    fn test_ips_are_sorted() {
        let mut records = RecordMap::new();
        records.insert("10.0.0.2".into(), ServerInterfaceRecord::new("10.0.0.2", false));
        records.insert("10.0.0.1".into(), ServerInterfaceRecord::new("10.0.0.1", false));

        let snapshot = Snapshot::new(records);
        assert_eq!(snapshot.ips(), vec!["10.0.0.1", "10.0.0.2"]);
        assert!(snapshot.built_at().is_some());
    }
}
