use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use branch_orders::api::mock::MockApi;
use branch_orders::feed::{FeedConfig, FeedHandle, FeedPhase, FeedSnapshot, OrderFeed};
use branch_orders::model::{OrderLine, OrderStatus, PlacedOrder};
use branch_orders::transition::TransitionError;

fn order(id: &str, status: OrderStatus) -> PlacedOrder {
    PlacedOrder {
        id: id.to_string(),
        branch_id: "branch_1".to_string(),
        table_number: Some(2),
        lines: vec![OrderLine {
            dish_id: "d1".to_string(),
            quantity: 1,
            unit_price: 50_000,
        }],
        total: 50_000,
        status,
        created_at: Utc::now(),
    }
}

fn config() -> FeedConfig {
    FeedConfig {
        poll_interval: Duration::from_secs(3_600),
        channel_capacity: 8,
    }
}

async fn wait_for<F>(handle: &FeedHandle, mut pred: F) -> FeedSnapshot
where
    F: FnMut(&FeedSnapshot) -> bool,
{
    let mut watch = handle.watch();
    loop {
        let snapshot = watch.borrow().clone();
        if pred(&snapshot) {
            return snapshot;
        }
        watch.changed().await.expect("feed task gone");
    }
}

/// READY requested on a CONFIRMED order is a non-adjacent jump: rejected
/// locally, no network call, client state unchanged.
#[tokio::test(start_paused = true)]
async fn test_non_adjacent_transition_is_rejected() {
    let api = Arc::new(MockApi::new());
    api.seed_order(order("o1", OrderStatus::Confirmed));

    let handle = OrderFeed::spawn(api.clone(), "branch_1".into(), config());
    wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

    let result = handle.transition("o1".into(), OrderStatus::Ready).await;
    assert_eq!(
        result,
        Err(TransitionError::NotAdjacent {
            from: OrderStatus::Confirmed,
            to: OrderStatus::Ready,
        })
    );

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.view().confirmed.len(), 1);
    assert!(snapshot.in_flight.is_empty());
    // Server state untouched.
    assert_eq!(api.orders()[0].status, OrderStatus::Confirmed);
    handle.shutdown().await;
}

/// A failed network call leaves the order in its last-known bucket and
/// clears the in-flight marker so an immediate retry is possible.
#[tokio::test(start_paused = true)]
async fn test_failed_transition_keeps_bucket_and_clears_marker() {
    let api = Arc::new(MockApi::new());
    api.seed_order(order("o1", OrderStatus::Preparing));

    let handle = OrderFeed::spawn(api.clone(), "branch_1".into(), config());
    wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

    api.fail_next_status();
    let result = handle.transition("o1".into(), OrderStatus::Ready).await;
    assert!(matches!(result, Err(TransitionError::Api(_))));

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.view().preparing.len(), 1, "order keeps its bucket");
    assert!(snapshot.in_flight.is_empty(), "marker cleared on failure");

    // Retry immediately; this time the backend cooperates.
    let updated = handle
        .transition("o1".into(), OrderStatus::Ready)
        .await
        .expect("retry failed");
    assert_eq!(updated.status, OrderStatus::Ready);
    handle.shutdown().await;
}

/// While a transition is outstanding for one order, repeat submissions for
/// that order are blocked; other orders are unaffected.
#[tokio::test(start_paused = true)]
async fn test_in_flight_marker_is_per_order() {
    let api = Arc::new(MockApi::new());
    api.seed_order(order("o1", OrderStatus::Confirmed));
    api.seed_order(order("o2", OrderStatus::Confirmed));
    api.set_status_delay(Duration::from_secs(5));

    let handle = OrderFeed::spawn(api.clone(), "branch_1".into(), config());
    wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

    let (first, duplicate, other) = tokio::join!(
        handle.transition("o1".into(), OrderStatus::Preparing),
        handle.transition("o1".into(), OrderStatus::Preparing),
        handle.transition("o2".into(), OrderStatus::Preparing),
    );

    assert!(first.is_ok());
    assert_eq!(
        duplicate,
        Err(TransitionError::InFlight("o1".to_string()))
    );
    assert!(other.is_ok(), "a different order is not blocked");
    handle.shutdown().await;
}

/// An order that is not in the current feed cannot be transitioned.
#[tokio::test(start_paused = true)]
async fn test_unknown_order_is_rejected() {
    let api = Arc::new(MockApi::new());
    let handle = OrderFeed::spawn(api, "branch_1".into(), config());
    wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

    let result = handle.transition("ghost".into(), OrderStatus::Preparing).await;
    assert_eq!(result, Err(TransitionError::UnknownOrder("ghost".into())));
    handle.shutdown().await;
}

/// When another staff member already advanced the order server-side, the
/// server rejects our now-stale request; the local bucket is corrected by
/// the next poll rather than an error path.
#[tokio::test(start_paused = true)]
async fn test_stale_client_assumption_defers_to_server() {
    let api = Arc::new(MockApi::new());
    api.seed_order(order("o1", OrderStatus::Confirmed));

    let handle = OrderFeed::spawn(api.clone(), "branch_1".into(), config());
    wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

    // Someone else advances the order behind our back.
    api.force_status("o1", OrderStatus::Preparing);

    let result = handle.transition("o1".into(), OrderStatus::Preparing).await;
    assert!(matches!(result, Err(TransitionError::Api(_))));
    assert!(handle.snapshot().in_flight.is_empty());

    // A refresh reconciles the list with server truth.
    handle.refresh().await.unwrap();
    wait_for(&handle, |s| !s.view().preparing.is_empty()).await;
    handle.shutdown().await;
}
