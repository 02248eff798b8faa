use std::sync::Arc;

use citydash_shard::mock::MockShard;
use citydash_shard::{PoolState, ShardError};
use futures_util::future::join_all;

mod common;
use common::pools;

#[tokio::test]
async fn session_is_reused_across_acquires() {
    let qui = MockShard::new("QUI");
    let pools = pools(&[qui.clone()]);

    let first = pools.acquire("QUI").await.expect("first acquire");
    pools.release(first.clone());
    let second = pools.acquire("qui").await.expect("second acquire");

    assert_eq!(qui.connects(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn release_never_closes_the_session() {
    let qui = MockShard::new("QUI");
    let pools = pools(&[qui.clone()]);

    let handle = pools.acquire("QUI").await.unwrap();
    pools.release(handle);

    assert_eq!(qui.closes(), 0);
    assert_eq!(
        pools.states().await,
        vec![PoolState {
            shard: "QUI".into(),
            open: true,
            connected: true
        }]
    );
    let again = pools.acquire("QUI").await.unwrap();
    assert!(again.is_connected());
    assert_eq!(qui.connects(), 1);
}

#[tokio::test]
async fn disconnected_session_is_replaced() {
    let qui = MockShard::new("QUI");
    let pools = pools(&[qui.clone()]);

    let stale = pools.acquire("QUI").await.unwrap();
    qui.disconnect();
    assert!(!stale.is_connected());

    let fresh = pools.acquire("QUI").await.unwrap();
    assert!(fresh.is_connected());
    assert_eq!(qui.connects(), 2);
    assert_eq!(qui.closes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_use_connects_once() {
    let qui = MockShard::new("QUI");
    let pools = pools(&[qui.clone()]);

    let handles = join_all((0..16).map(|_| {
        let pools = pools.clone();
        tokio::spawn(async move { pools.acquire("QUI").await })
    }))
    .await;

    let handles: Vec<_> = handles
        .into_iter()
        .map(|h| h.expect("join").expect("acquire"))
        .collect();
    assert_eq!(qui.connects(), 1);
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
}

#[tokio::test]
async fn failed_connect_leaves_no_entry_and_is_retried() {
    let gye = MockShard::new("GYE").refusing_connections();
    let pools = pools(&[gye.clone()]);

    let err = match pools.acquire("GYE").await {
        Err(e) => e,
        Ok(_) => panic!("refused shard must not yield a session"),
    };
    assert!(err.is_unreachable());
    assert_eq!(err.shard(), Some("GYE"));
    assert!(!pools.states().await[0].open);

    gye.set_fail_connect(false);
    pools.acquire("GYE").await.expect("retry succeeds");
    assert_eq!(gye.connects(), 2);
}

#[tokio::test]
async fn unknown_shard_is_rejected_without_connecting() {
    let qui = MockShard::new("QUI");
    let pools = pools(&[qui.clone()]);

    assert!(matches!(
        pools.acquire("XYZ").await,
        Err(ShardError::UnknownShard(code)) if code == "XYZ"
    ));
    assert_eq!(qui.connects(), 0);
}

#[tokio::test]
async fn evict_and_shutdown_close_sessions() {
    let qui = MockShard::new("QUI");
    let gye = MockShard::new("GYE");
    let pools = pools(&[qui.clone(), gye.clone()]);

    pools.acquire("QUI").await.unwrap();
    pools.acquire("GYE").await.unwrap();

    assert!(pools.evict("qui").await);
    assert!(!pools.evict("QUI").await);
    assert_eq!(qui.closes(), 1);

    pools.shutdown().await;
    assert_eq!(gye.closes(), 1);
    assert!(pools.states().await.iter().all(|s| !s.open));
}
