//! Architectural Contract Test: Snapshot Atomicity
//!
//! Readers running concurrently with replacements must observe either the
//! complete old snapshot or the complete new one.
//!
//! Constraints verified:
//! - No reader ever sees a mix of two snapshots
//! - A snapshot obtained by a reader stays unchanged after a replacement
//!
//! If this test fails, someone has started mutating the installed
//! snapshot in place instead of swapping it.

use std::sync::Arc;
use throttlewatch_core::state::{RecordMap, ServerInterfaceRecord, Snapshot, SnapshotStore};

fn snapshot(prefix: &str, count: usize, throttled: bool) -> Snapshot {
    let records: RecordMap = (0..count)
        .map(|i| {
            let ip = format!("{}.{}", prefix, i);
            (ip.clone(), ServerInterfaceRecord::new(ip, throttled))
        })
        .collect();
    Snapshot::new(records)
}

/// The snapshot a reader saw must be entirely A or entirely B
fn assert_consistent(seen: &Snapshot) {
    let ips = seen.ips();
    if ips.is_empty() {
        return;
    }

    if ips[0].starts_with("10.0.0") {
        assert_eq!(seen.len(), 10, "partial A snapshot observed");
        assert!(ips.iter().all(|ip| ip.starts_with("10.0.0")), "mixed snapshot observed");
        assert!(seen.records().all(|record| !record.throttled));
    } else {
        assert_eq!(seen.len(), 25, "partial B snapshot observed");
        assert!(ips.iter().all(|ip| ip.starts_with("10.1.0")), "mixed snapshot observed");
        assert!(seen.records().all(|record| record.throttled));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_mixed_snapshot() {
    let store = SnapshotStore::new();
    let a = snapshot("10.0.0", 10, false);
    let b = snapshot("10.1.0", 25, true);
    store.replace(a.clone()).await;

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                let next = if i % 2 == 0 { b.clone() } else { a.clone() };
                store.replace(next).await;
                tokio::task::yield_now().await;
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    let seen = store.read().await;
                    assert_consistent(&seen);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.expect("writer task panicked");
    for reader in readers {
        reader.await.expect("reader observed an inconsistent snapshot");
    }
}

#[tokio::test]
async fn held_snapshot_survives_replacement() {
    let store = SnapshotStore::new();
    store.replace(snapshot("10.0.0", 10, false)).await;

    let held: Arc<Snapshot> = store.read().await;
    store.replace(snapshot("10.1.0", 25, true)).await;

    assert_eq!(held.len(), 10);
    assert_consistent(&held);
    assert_eq!(store.read().await.len(), 25);
}
