//! The branch order feed: interval polling, reconciliation, and staff
//! mutations over one branch's open orders.
//!
//! The feed runs as a Tokio task that exclusively owns the order list, the
//! dish cache, and the per-order in-flight markers — the single-writer model
//! means no locks around feed state. Network calls (the poll fetch, the dish
//! fan-out, status updates) are spawned so the loop keeps processing
//! commands while they are pending; their results come back as internal
//! events on a channel the task owns.
//!
//! The UI side holds a [`FeedHandle`]: it reads last-known-good
//! [`FeedSnapshot`]s from a `watch` channel, and sends refresh and
//! transition commands. Dropping the handle (or calling
//! [`FeedHandle::shutdown`]) closes the command channel; the task exits its
//! loop, the interval timer dies with it, and any still-running network
//! call settles into a closed event channel and is discarded.

pub mod error;

pub use error::*;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{ApiError, OrderApi};
use crate::dish_cache::{self, DishCache};
use crate::model::{BranchId, DishDetails, DishId, OrderId, OrderStatus, PlacedOrder, StaffOrderView};
use crate::transition::{validate_transition, InFlightMarkers, TransitionError};

/// Tuning knobs for one feed instance.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Automatic re-fetch period while the feed is running.
    pub poll_interval: Duration,
    /// Command channel capacity.
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            channel_capacity: 32,
        }
    }
}

/// Where the feed is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// Spawned but the first fetch has not been dispatched yet.
    Idle,
    /// A fetch is in flight; the previous list is still shown.
    Fetching,
    /// The last fetch settled (successfully or not).
    Ready,
}

/// Immutable last-known-good view of the feed, published on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub phase: FeedPhase,
    /// Open orders, sorted by creation time ascending (staff process
    /// oldest-first). Replaced wholesale on every successful fetch.
    pub orders: Vec<PlacedOrder>,
    /// Dish metadata resolved so far this session.
    pub dishes: DishCache,
    /// Orders with an outstanding transition request.
    pub in_flight: HashSet<OrderId>,
    /// Message from the most recent failed fetch, cleared on the next
    /// success. Never makes the feed unusable.
    pub last_error: Option<String>,
}

impl FeedSnapshot {
    fn idle() -> Self {
        Self {
            phase: FeedPhase::Idle,
            orders: Vec::new(),
            dishes: DishCache::new(),
            in_flight: HashSet::new(),
            last_error: None,
        }
    }

    /// The three staff dashboard buckets for the current order list.
    pub fn view(&self) -> StaffOrderView {
        StaffOrderView::partition(&self.orders)
    }
}

/// Commands sent from the handle to the feed task.
enum FeedCommand {
    Refresh,
    Transition {
        order_id: OrderId,
        target: OrderStatus,
        respond_to: oneshot::Sender<Result<PlacedOrder, TransitionError>>,
    },
}

/// Completions of spawned network calls, routed back to the feed task.
enum FeedEvent {
    FetchDone(Result<Vec<PlacedOrder>, ApiError>),
    DishesResolved(HashMap<DishId, DishDetails>),
    TransitionDone {
        order_id: OrderId,
        result: Result<PlacedOrder, ApiError>,
        respond_to: oneshot::Sender<Result<PlacedOrder, TransitionError>>,
    },
}

/// Factory for the feed task.
pub struct OrderFeed;

impl OrderFeed {
    /// Spawns the feed task for one branch and returns its handle.
    ///
    /// The first fetch is dispatched immediately; interval polling starts
    /// one period later.
    pub fn spawn(api: Arc<dyn OrderApi>, branch_id: BranchId, config: FeedConfig) -> FeedHandle {
        let (commands_tx, commands_rx) = mpsc::channel(config.channel_capacity);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(FeedSnapshot::idle());

        let actor = FeedActor {
            api,
            branch_id,
            commands: commands_rx,
            events: events_rx,
            events_tx,
            snapshot: snapshot_tx,
            orders: Vec::new(),
            dishes: DishCache::new(),
            markers: InFlightMarkers::new(),
            phase: FeedPhase::Idle,
            last_error: None,
            fetching: false,
            refetch_queued: false,
        };
        let task = tokio::spawn(actor.run(config.poll_interval));

        FeedHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
            task,
        }
    }
}

/// UI-side handle to a running feed.
pub struct FeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    snapshot: watch::Receiver<FeedSnapshot>,
    task: tokio::task::JoinHandle<()>,
}

impl FeedHandle {
    /// The latest published snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A watch receiver for change notifications.
    pub fn watch(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot.clone()
    }

    /// Requests an immediate re-fetch, short-circuiting the interval.
    ///
    /// If a fetch is already in flight the request coalesces into a single
    /// re-fetch once the current one completes.
    pub async fn refresh(&self) -> Result<(), FeedError> {
        self.commands
            .send(FeedCommand::Refresh)
            .await
            .map_err(|_| FeedError::Closed)
    }

    /// Requests a status advance for one order.
    ///
    /// Validated locally (adjacency, per-order in-flight marker) before the
    /// server round-trip; a success forces an immediate re-fetch so the
    /// order moves buckets without waiting for the next tick.
    pub async fn transition(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<PlacedOrder, TransitionError> {
        let (respond_to, response) = oneshot::channel();
        self.commands
            .send(FeedCommand::Transition {
                order_id,
                target,
                respond_to,
            })
            .await
            .map_err(|_| TransitionError::FeedClosed)?;
        response.await.map_err(|_| TransitionError::FeedClosed)?
    }

    /// Stops the feed task and waits for it to exit.
    ///
    /// In-flight network calls are allowed to settle but their results are
    /// discarded; no state update happens after this returns.
    pub async fn shutdown(self) {
        drop(self.commands);
        let _ = self.task.await;
    }
}

/// The feed task: single writer of all feed state.
struct FeedActor {
    api: Arc<dyn OrderApi>,
    branch_id: BranchId,
    commands: mpsc::Receiver<FeedCommand>,
    events: mpsc::UnboundedReceiver<FeedEvent>,
    events_tx: mpsc::UnboundedSender<FeedEvent>,
    snapshot: watch::Sender<FeedSnapshot>,
    orders: Vec<PlacedOrder>,
    dishes: DishCache,
    markers: InFlightMarkers,
    phase: FeedPhase,
    last_error: Option<String>,
    fetching: bool,
    refetch_queued: bool,
}

impl FeedActor {
    async fn run(mut self, poll_interval: Duration) {
        info!(branch_id = %self.branch_id, "Feed started");
        self.trigger_fetch();

        let mut ticker =
            tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.trigger_fetch(),
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // All handles dropped: tear down. The ticker dies with
                    // this task and spawned calls settle into a closed
                    // event channel.
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_event(event),
            }
        }

        info!(branch_id = %self.branch_id, orders = self.orders.len(), "Feed stopped");
    }

    fn handle_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::Refresh => self.trigger_fetch(),
            FeedCommand::Transition {
                order_id,
                target,
                respond_to,
            } => self.start_transition(order_id, target, respond_to),
        }
    }

    fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::FetchDone(result) => self.apply_fetch(result),
            FeedEvent::DishesResolved(batch) => {
                debug!(resolved = batch.len(), "Dish batch merged");
                self.dishes.merge(batch);
                self.publish();
            }
            FeedEvent::TransitionDone {
                order_id,
                result,
                respond_to,
            } => self.finish_transition(order_id, result, respond_to),
        }
    }

    /// Dispatches a fetch, or queues one if a fetch is already in flight.
    fn trigger_fetch(&mut self) {
        if self.fetching {
            self.refetch_queued = true;
            return;
        }
        self.fetching = true;
        self.phase = FeedPhase::Fetching;
        self.publish();

        let api = self.api.clone();
        let branch_id = self.branch_id.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_open_orders(&branch_id).await;
            let _ = events.send(FeedEvent::FetchDone(result));
        });
    }

    fn apply_fetch(&mut self, result: Result<Vec<PlacedOrder>, ApiError>) {
        self.fetching = false;
        self.phase = FeedPhase::Ready;
        match result {
            Ok(mut orders) => {
                // Full replace: the server is the sole source of truth for
                // which orders are still open. Oldest first for staff.
                orders.sort_by_key(|o| o.created_at);
                let unresolved = self.dishes.unresolved_ids(&orders);
                debug!(
                    orders = orders.len(),
                    unresolved = unresolved.len(),
                    "Feed replaced"
                );
                self.orders = orders;
                self.last_error = None;
                if !unresolved.is_empty() {
                    let api = self.api.clone();
                    let branch_id = self.branch_id.clone();
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let batch = dish_cache::resolve_batch(api, branch_id, unresolved).await;
                        let _ = events.send(FeedEvent::DishesResolved(batch));
                    });
                }
            }
            Err(e) => {
                // Stale-but-available: keep the previous list, show a
                // transient notification, retry on the next cycle.
                warn!(error = %e, "Feed fetch failed, retaining previous list");
                self.last_error = Some(e.to_string());
            }
        }
        if self.refetch_queued {
            self.refetch_queued = false;
            self.trigger_fetch();
        }
        self.publish();
    }

    fn start_transition(
        &mut self,
        order_id: OrderId,
        target: OrderStatus,
        respond_to: oneshot::Sender<Result<PlacedOrder, TransitionError>>,
    ) {
        let current = match self.orders.iter().find(|o| o.id == order_id) {
            Some(order) => order.status,
            None => {
                let _ = respond_to.send(Err(TransitionError::UnknownOrder(order_id)));
                return;
            }
        };
        if let Err(e) = self.markers.acquire(&order_id) {
            let _ = respond_to.send(Err(e));
            return;
        }
        if let Err(e) = validate_transition(current, target) {
            self.markers.release(&order_id);
            let _ = respond_to.send(Err(e));
            return;
        }
        debug!(%order_id, from = %current, to = %target, "Transition dispatched");
        self.publish();

        let api = self.api.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.update_order_status(&order_id, target).await;
            let _ = events.send(FeedEvent::TransitionDone {
                order_id,
                result,
                respond_to,
            });
        });
    }

    fn finish_transition(
        &mut self,
        order_id: OrderId,
        result: Result<PlacedOrder, ApiError>,
        respond_to: oneshot::Sender<Result<PlacedOrder, TransitionError>>,
    ) {
        self.markers.release(&order_id);
        match result {
            Ok(order) => {
                info!(%order_id, status = %order.status, "Transition applied");
                // The server's returned order wins over whatever status the
                // client assumed, including advances made by other staff.
                if let Some(slot) = self.orders.iter_mut().find(|o| o.id == order.id) {
                    *slot = order.clone();
                }
                let _ = respond_to.send(Ok(order));
                self.trigger_fetch();
            }
            Err(e) => {
                warn!(%order_id, error = %e, "Transition failed, order keeps its bucket");
                let _ = respond_to.send(Err(TransitionError::Api(e)));
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot.send_replace(FeedSnapshot {
            phase: self.phase,
            orders: self.orders.clone(),
            dishes: self.dishes.clone(),
            in_flight: self.markers.snapshot(),
            last_error: self.last_error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::api::mock::MockApi;
    use crate::model::{DishDetails, OrderLine};

    fn order(id: &str, status: OrderStatus, minute: u32, dish_ids: &[&str]) -> PlacedOrder {
        PlacedOrder {
            id: id.to_string(),
            branch_id: "b1".to_string(),
            table_number: Some(1),
            lines: dish_ids
                .iter()
                .map(|d| OrderLine {
                    dish_id: d.to_string(),
                    quantity: 1,
                    unit_price: 10_000,
                })
                .collect(),
            total: 10_000 * dish_ids.len() as u64,
            status,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
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

    fn slow_config() -> FeedConfig {
        // Interval far away so tests drive fetches explicitly.
        FeedConfig {
            poll_interval: Duration::from_secs(3_600),
            channel_capacity: 8,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_replaces_list_sorted_oldest_first() {
        let api = Arc::new(MockApi::new());
        api.seed_order(order("o2", OrderStatus::Confirmed, 30, &[]));
        api.seed_order(order("o1", OrderStatus::Confirmed, 10, &[]));

        let handle = OrderFeed::spawn(api, "b1".to_string(), slow_config());
        let snapshot = wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

        let ids: Vec<_> = snapshot.orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn interval_drives_repeat_fetches() {
        let api = Arc::new(MockApi::new());
        let handle = OrderFeed::spawn(api.clone(), "b1".to_string(), FeedConfig::default());

        wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;
        assert_eq!(api.fetch_calls(), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        wait_for(&handle, |_| api.fetch_calls() >= 2).await;
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_triggers_coalesce_into_one_refetch() {
        let api = Arc::new(MockApi::new());
        api.set_fetch_delay(Duration::from_secs(5));
        let handle = OrderFeed::spawn(api.clone(), "b1".to_string(), slow_config());

        // Initial fetch is sleeping inside the mock; pile up triggers.
        handle.refresh().await.unwrap();
        handle.refresh().await.unwrap();
        handle.refresh().await.unwrap();

        tokio::time::sleep(Duration::from_secs(12)).await;
        wait_for(&handle, |_| api.fetch_calls() >= 2).await;

        // One in-flight fetch plus exactly one coalesced follow-up.
        assert_eq!(api.fetch_calls(), 2);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_retains_previous_list() {
        let api = Arc::new(MockApi::new());
        api.seed_order(order("o1", OrderStatus::Confirmed, 10, &[]));
        let handle = OrderFeed::spawn(api.clone(), "b1".to_string(), slow_config());
        wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

        api.fail_next_fetch();
        handle.refresh().await.unwrap();
        let snapshot = wait_for(&handle, |s| s.last_error.is_some()).await;
        assert_eq!(snapshot.orders.len(), 1, "stale list must be retained");
        assert_eq!(snapshot.phase, FeedPhase::Ready);

        // The next successful cycle clears the transient error.
        handle.refresh().await.unwrap();
        let snapshot = wait_for(&handle, |s| s.last_error.is_none() && s.phase == FeedPhase::Ready).await;
        assert_eq!(snapshot.orders.len(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_in_flight_fetch() {
        let api = Arc::new(MockApi::new());
        api.seed_order(order("o1", OrderStatus::Confirmed, 10, &[]));
        api.set_fetch_delay(Duration::from_secs(5));

        let handle = OrderFeed::spawn(api.clone(), "b1".to_string(), slow_config());
        let watch = handle.watch();
        // Let the feed dispatch its first fetch before tearing down.
        tokio::task::yield_now().await;
        handle.shutdown().await;

        // Let the in-flight fetch settle; its result must be discarded.
        tokio::time::sleep(Duration::from_secs(6)).await;
        let snapshot = watch.borrow().clone();
        assert!(snapshot.orders.is_empty(), "no state update after teardown");
        assert_eq!(api.fetch_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn only_uncached_dishes_are_fetched() {
        let api = Arc::new(MockApi::new());
        api.seed_dish(DishDetails::new("d1", "Satay", 35_000));
        api.seed_dish(DishDetails::new("d2", "Fried Rice", 28_000));
        api.seed_order(order("o1", OrderStatus::Confirmed, 10, &["d1"]));

        let handle = OrderFeed::spawn(api.clone(), "b1".to_string(), slow_config());
        wait_for(&handle, |s| s.dishes.contains("d1")).await;
        assert_eq!(api.dish_calls(), vec!["d1"]);

        // A later cycle references d1 (cached) and d2 (new).
        api.seed_order(order("o2", OrderStatus::Confirmed, 20, &["d1", "d2"]));
        handle.refresh().await.unwrap();
        wait_for(&handle, |s| s.dishes.contains("d2")).await;

        let calls = api.dish_calls();
        assert_eq!(calls.iter().filter(|d| d.as_str() == "d1").count(), 1);
        assert_eq!(calls.iter().filter(|d| d.as_str() == "d2").count(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dish_is_retried_next_cycle() {
        let api = Arc::new(MockApi::new());
        api.seed_dish(DishDetails::new("d1", "Satay", 35_000));
        api.fail_dish("d1");
        api.seed_order(order("o1", OrderStatus::Confirmed, 10, &["d1"]));

        let handle = OrderFeed::spawn(api.clone(), "b1".to_string(), slow_config());
        wait_for(&handle, |s| s.phase == FeedPhase::Ready).await;

        // First resolution attempt fails; placeholder until the next cycle.
        wait_for(&handle, |_| api.dish_calls().len() >= 1).await;
        assert!(!handle.snapshot().dishes.contains("d1"));

        api.heal_dish("d1");
        handle.refresh().await.unwrap();
        wait_for(&handle, |s| s.dishes.contains("d1")).await;
        handle.shutdown().await;
    }
}
