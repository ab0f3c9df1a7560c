//! Optimistic user actions and tap handling.

mod support;

use std::sync::atomic::Ordering;

use notifsync_core::config::SyncConfig;
use notifsync_core::traits::PermissionStatus;
use notifsync_core::types::{NotificationData, NotificationResponse};
use notifsync_engine::navigation::{CART_ROUTE, NOTIFICATIONS_ROUTE, ORDER_DETAIL_ROUTE};
use notifsync_engine::{Acknowledgement, CycleOutcome, SyncStage};

use support::{Harness, MockFeed, at, remote};

fn seeded(records: Vec<notifsync_core::types::NotificationRecord>) -> Harness {
    let h = Harness::new(records.clone());
    h.engine.store().replace_all(records);
    h
}

#[tokio::test]
async fn test_mark_one_read_confirms_remote() {
    let h = seeded(vec![remote("r1", 1), remote("r2", 2)]);

    let ack = h.engine.mark_one_read("r1").await;

    assert!(matches!(ack, Acknowledgement::Confirmed));
    assert_eq!(h.feed.acked(), vec!["r1"]);
    assert_eq!(h.engine.store().unread_count(), 1);
}

#[tokio::test]
async fn test_mark_one_read_never_sends_local_ids() {
    let h = seeded(Vec::new());
    let echo = remote("r1", 1).echo("local_1714550400000_abc123def".into(), at(1));
    h.engine.store().upsert_local(echo);

    let ack = h.engine.mark_one_read("local_1714550400000_abc123def").await;

    assert!(matches!(ack, Acknowledgement::LocalOnly));
    assert!(!ack.reached_backend());
    assert!(h.feed.ack_attempts().is_empty());
    assert_eq!(h.engine.store().unread_count(), 0);
}

#[tokio::test]
async fn test_mark_one_read_unknown_or_already_read() {
    let h = seeded(vec![remote("r1", 1)]);

    assert!(matches!(
        h.engine.mark_one_read("missing").await,
        Acknowledgement::NotFound
    ));
    h.engine.mark_one_read("r1").await;
    assert!(matches!(
        h.engine.mark_one_read("r1").await,
        Acknowledgement::Unchanged
    ));
    assert_eq!(h.feed.ack_attempts(), vec!["r1"]);
}

#[tokio::test]
async fn test_mark_one_read_failure_keeps_local_state_and_reconciles() {
    let h = seeded(vec![remote("r1", 1)]);
    h.feed.fail_ack_for("r1");

    let ack = h.engine.mark_one_read("r1").await;

    // Optimistic update stands until the reconciliation commits.
    assert!(h.engine.store().snapshot().get("r1").unwrap().read);
    let Acknowledgement::Failed { failure, reconcile } = ack else {
        panic!("expected a failed acknowledgement");
    };
    assert_eq!(failure.stage, SyncStage::MarkRead);
    assert_eq!(failure.record_id.as_deref(), Some("r1"));

    let outcome = reconcile.expect("reconcile enabled by default").await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Completed(_)));
    assert_eq!(h.feed.fetches(), 1);
    // Backend still has it unread; the refresh surfaces it again as an echo,
    // which carries the unread state on its own.
    let snapshot = h.engine.store().snapshot();
    assert!(snapshot.has_echo_for("r1"));
    assert!(snapshot.get("r1").unwrap().read);
    assert_eq!(snapshot.unread_count(), 1);
}

#[tokio::test]
async fn test_failure_without_reconcile_spawns_nothing() {
    let config = SyncConfig {
        reconcile_on_failure: false,
        ..SyncConfig::default()
    };
    let h = Harness::build(MockFeed::new(Vec::new()), PermissionStatus::Granted, config);
    h.engine.store().replace_all(vec![remote("r1", 1)]);
    h.feed.fail_mutations.store(true, Ordering::SeqCst);

    let ack = h.engine.mark_one_read("r1").await;

    assert!(matches!(ack, Acknowledgement::Failed { reconcile: None, .. }));
    tokio::task::yield_now().await;
    assert_eq!(h.feed.fetches(), 0);
}

#[tokio::test]
async fn test_mark_all_read_issues_single_backend_call() {
    let h = seeded(vec![remote("r1", 1), remote("r2", 2), remote("r3", 3)]);

    let ack = h.engine.mark_all_read().await;

    assert!(matches!(ack, Acknowledgement::Confirmed));
    assert_eq!(h.feed.acked_all.load(Ordering::SeqCst), 1);
    assert!(h.feed.ack_attempts().is_empty());
    assert_eq!(h.engine.store().unread_count(), 0);

    // Nothing unread locally, but the backend is still told.
    assert!(matches!(
        h.engine.mark_all_read().await,
        Acknowledgement::Confirmed
    ));
    assert_eq!(h.feed.acked_all.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_mark_all_read_reaches_backend_after_failed_single_read() {
    let config = SyncConfig {
        reconcile_on_failure: false,
        ..SyncConfig::default()
    };
    let h = Harness::build(MockFeed::new(vec![remote("r1", 1)]), PermissionStatus::Granted, config);
    h.engine.store().replace_all(vec![remote("r1", 1)]);
    h.feed.fail_ack_for("r1");

    let single = h.engine.mark_one_read("r1").await;
    assert!(matches!(single, Acknowledgement::Failed { reconcile: None, .. }));
    assert_eq!(h.engine.store().unread_count(), 0);

    let all = h.engine.mark_all_read().await;

    assert!(matches!(all, Acknowledgement::Confirmed));
    assert_eq!(h.feed.acked_all.load(Ordering::SeqCst), 1);
    assert!(h.feed.upstream.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_all_read_failure_reconciles() {
    let h = seeded(vec![remote("r1", 1)]);
    h.feed.fail_mutations.store(true, Ordering::SeqCst);

    let ack = h.engine.mark_all_read().await;

    let Acknowledgement::Failed { failure, reconcile } = ack else {
        panic!("expected a failed acknowledgement");
    };
    assert_eq!(failure.stage, SyncStage::MarkAllRead);
    assert!(failure.record_id.is_none());
    assert_eq!(h.engine.store().unread_count(), 0);
    reconcile.unwrap().await.unwrap();
    assert_eq!(h.feed.fetches(), 1);
}

#[tokio::test]
async fn test_mark_all_read_signed_out_stays_local() {
    let h = seeded(vec![remote("r1", 1)]);
    h.identity.sign_out();

    let ack = h.engine.mark_all_read().await;

    assert!(matches!(ack, Acknowledgement::LocalOnly));
    assert_eq!(h.feed.acked_all.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine.store().unread_count(), 0);

    assert!(matches!(
        h.engine.mark_all_read().await,
        Acknowledgement::Unchanged
    ));
}

#[tokio::test]
async fn test_delete_remote_and_local() {
    let h = seeded(vec![remote("r1", 1), remote("r2", 2)]);
    let echo = remote("r2", 2).echo("local_1_aaaaaaaaa".into(), at(2));
    h.engine.store().upsert_local(echo);

    assert!(matches!(h.engine.delete("r1").await, Acknowledgement::Confirmed));
    assert!(matches!(
        h.engine.delete("local_1_aaaaaaaaa").await,
        Acknowledgement::LocalOnly
    ));
    assert!(matches!(h.engine.delete("r1").await, Acknowledgement::NotFound));

    assert_eq!(*h.feed.deleted.lock().unwrap(), vec!["r1"]);
    assert_eq!(h.ids(), vec!["r2"]);
    assert_eq!(h.engine.store().unread_count(), 1);
}

#[tokio::test]
async fn test_delete_failure_keeps_record_removed() {
    let h = seeded(vec![remote("r1", 1)]);
    h.feed.fail_mutations.store(true, Ordering::SeqCst);
    h.feed.set_upstream(Vec::new());

    let ack = h.engine.delete("r1").await;

    let Acknowledgement::Failed { failure, reconcile } = ack else {
        panic!("expected a failed acknowledgement");
    };
    assert_eq!(failure.stage, SyncStage::Delete);
    assert!(!h.engine.store().snapshot().contains("r1"));
    reconcile.unwrap().await.unwrap();
    assert!(h.engine.store().snapshot().is_empty());
}

#[tokio::test]
async fn test_open_marks_read_and_navigates() {
    let data = NotificationData::new()
        .with("screen", "OrderDetails")
        .with("orderId", 42_i64);
    let h = seeded(vec![remote("r1", 1).with_data(data)]);

    let destination = h.engine.open("r1").await.expect("record exists");

    assert_eq!(destination.route, ORDER_DETAIL_ROUTE);
    assert_eq!(destination.param("orderId"), Some("42"));
    assert_eq!(h.router.destinations(), vec![destination]);
    assert_eq!(h.feed.acked(), vec!["r1"]);
    assert!(h.engine.open("missing").await.is_none());
}

#[tokio::test]
async fn test_tap_on_echo_marks_it_read_and_opens_cart() {
    let data = NotificationData::new()
        .with("screen", "NegotiationDetails")
        .with("action", "load_cart")
        .with("cartId", "c-9")
        .with("sessionId", "s-3");
    let h = seeded(Vec::new());
    let echo = remote("r1", 1)
        .with_data(data.clone())
        .echo("local_5_bbbbbbbbb".into(), at(1));
    h.engine.store().upsert_local(echo);

    let destination = h
        .engine
        .handle_response(NotificationResponse {
            notification_id: Some("local_5_bbbbbbbbb".into()),
            data,
        })
        .await;

    assert_eq!(destination.route, CART_ROUTE);
    assert_eq!(destination.param("cartId"), Some("c-9"));
    assert_eq!(destination.param("action"), Some("load_cart"));
    assert_eq!(h.engine.store().unread_count(), 0);
    assert!(h.feed.ack_attempts().is_empty());
    assert_eq!(h.router.destinations().len(), 1);
}

#[tokio::test]
async fn test_tap_without_payload_opens_list() {
    let h = seeded(Vec::new());

    let destination = h
        .engine
        .handle_response(NotificationResponse {
            notification_id: None,
            data: NotificationData::new(),
        })
        .await;

    assert_eq!(destination.route, NOTIFICATIONS_ROUTE);
    assert!(destination.params.is_empty());
}
