//! Behavior Contract Test: Shutdown Cleanup
//!
//! This test verifies that stopping the engine withdraws this node's own
//! published records, so peers converge without waiting for implicit
//! expiry, and that shutdown is deterministic.
//!
//! Constraints verified:
//! - Locally published RP-candidate and BP-candidate records are removed
//! - The engine task terminates promptly after the shutdown signal
//! - A Stopped event is emitted
//! - A stopped engine reports no pending evaluation rounds

mod common;

use common::*;
use mcoord_core::traits::{NodeId, RecordType, SharedStateStore};
use mcoord_core::{CoordConfig, CoordEngine, EngineEvent, StaticAddressProvider};

#[tokio::test]
async fn shutdown_withdraws_own_records() {
    let store = store_with_local(5);
    let notifier = RecordingNotifier::new();

    // A local external-connection marker makes this node a BP candidate
    store
        .publish(RecordType::ExternalConnection, Vec::new())
        .await
        .unwrap();

    let (mut engine, mut events) = CoordEngine::new(
        Box::new(store.clone()),
        Box::new(IdleIfaceMonitor),
        Box::new(StaticAddressProvider::new(addr(1))),
        Box::new(notifier.clone()),
        test_config(),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    settle().await;

    // Sanity: alone in the set, the node elected itself RP; the marker
    // published before startup is visible to the BP round once it runs
    let local = store.local_node();
    assert_eq!(
        store
            .records_of(&local, RecordType::RpaCandidate)
            .await
            .unwrap()
            .len(),
        1
    );

    shutdown_tx.send(()).unwrap();
    let run_result = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("engine terminates promptly after shutdown")
        .unwrap();
    run_result.unwrap();

    assert!(
        store
            .records_of(&local, RecordType::RpaCandidate)
            .await
            .unwrap()
            .is_empty(),
        "RP candidacy must be withdrawn on shutdown"
    );
    assert!(
        store
            .records_of(&local, RecordType::BorderProxy)
            .await
            .unwrap()
            .is_empty(),
        "BP advertisement must be withdrawn on shutdown"
    );

    // The event stream carries Started first and Stopped last
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.first(), Some(&EngineEvent::Started));
    assert!(matches!(seen.last(), Some(EngineEvent::Stopped { .. })));
}

#[tokio::test]
async fn engine_without_churn_is_quiet_after_initial_election() {
    let store = store_with_local(5);
    let notifier = RecordingNotifier::new();

    let (mut engine, _events) = CoordEngine::new(
        Box::new(store.clone()),
        Box::new(IdleIfaceMonitor),
        Box::new(StaticAddressProvider::new(addr(1))),
        Box::new(notifier.clone()),
        test_config(),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    settle().await;
    let after_first = notifier.seen_role("rpa").len();
    settle().await;
    settle().await;
    let after_idle = notifier.seen_role("rpa").len();

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(after_first, 1, "exactly one self-election");
    assert_eq!(after_idle, 1, "idle engine must not re-notify");
}

#[tokio::test]
async fn busy_tracks_timer_lifecycle_and_shutdown() {
    let store = store_with_local(5);
    let notifier = RecordingNotifier::new();

    // Long debounce so the pending window is wide enough to observe; no
    // local address, so the initial election round publishes nothing and
    // the engine goes fully idle afterwards
    let mut config = CoordConfig::default();
    config.engine.rp_election_delay_ms = 200;
    config.engine.bp_update_delay_ms = 200;

    let (mut engine, _events) = CoordEngine::new(
        Box::new(store.clone()),
        Box::new(IdleIfaceMonitor),
        Box::new(StaticAddressProvider::unavailable()),
        Box::new(notifier.clone()),
        config,
    )
    .expect("engine construction succeeds");

    let busy = engine.busy_handle();
    assert!(!busy.busy(), "nothing pending before the engine runs");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Startup arms the initial election round
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(busy.busy(), "initial election round must be pending");

    // The round fires and, with nothing to publish, nothing re-arms
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    assert!(!busy.busy(), "engine must go idle after the round runs");

    // Remote candidate churn arms a fresh election round
    store
        .remote_publish(
            NodeId::new([9u8]),
            RecordType::RpaCandidate,
            addr(9).octets().to_vec(),
        )
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(busy.busy(), "candidate churn must re-arm the election round");

    // Shutdown lands while the round is still pending
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
    assert!(!busy.busy(), "a stopped engine must leave no pending rounds");
}
