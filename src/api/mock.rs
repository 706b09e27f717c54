//! In-memory [`OrderApi`] for tests.
//!
//! [`MockApi`] behaves like a tiny backend: it owns a set of orders and
//! dishes, allocates order ids from a counter, and enforces the same
//! forward-only status rule the real server does. Tests can inject one-shot
//! failures and inspect which calls were made, so client behavior under
//! partial failure is deterministic to exercise.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::api::{ApiError, OrderApi};
use crate::model::{
    BranchId, DishDetails, DishId, NewOrder, OrderId, OrderStatus, PlacedOrder,
};

#[derive(Default)]
struct Backend {
    orders: Vec<PlacedOrder>,
    dishes: HashMap<DishId, DishDetails>,
}

/// A scripted in-memory backend implementing [`OrderApi`].
pub struct MockApi {
    backend: Mutex<Backend>,
    next_order: AtomicU64,
    fail_next_fetch: AtomicBool,
    fail_next_create: AtomicBool,
    fail_next_status: AtomicBool,
    failing_dishes: Mutex<HashSet<DishId>>,
    fetch_calls: AtomicUsize,
    dish_calls: Mutex<Vec<DishId>>,
    fetch_delay: Mutex<Duration>,
    status_delay: Mutex<Duration>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            backend: Mutex::new(Backend::default()),
            next_order: AtomicU64::new(1),
            fail_next_fetch: AtomicBool::new(false),
            fail_next_create: AtomicBool::new(false),
            fail_next_status: AtomicBool::new(false),
            failing_dishes: Mutex::new(HashSet::new()),
            fetch_calls: AtomicUsize::new(0),
            dish_calls: Mutex::new(Vec::new()),
            fetch_delay: Mutex::new(Duration::ZERO),
            status_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Registers a dish the backend can resolve.
    pub fn seed_dish(&self, dish: DishDetails) {
        let mut backend = self.backend.lock().unwrap();
        backend.dishes.insert(dish.id.clone(), dish);
    }

    /// Inserts an order directly into the backend, bypassing `create_order`.
    pub fn seed_order(&self, order: PlacedOrder) {
        self.backend.lock().unwrap().orders.push(order);
    }

    /// Mutates an order's status server-side, as another staff member would.
    pub fn force_status(&self, order_id: &str, status: OrderStatus) {
        let mut backend = self.backend.lock().unwrap();
        if let Some(order) = backend.orders.iter_mut().find(|o| o.id == order_id) {
            order.status = status;
        }
    }

    /// Snapshot of the backend's current orders.
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.backend.lock().unwrap().orders.clone()
    }

    /// Makes the next `fetch_open_orders` call fail with a network error.
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Makes the next `create_order` call fail with a network error.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Makes the next `update_order_status` call fail with a network error.
    pub fn fail_next_status(&self) {
        self.fail_next_status.store(true, Ordering::SeqCst);
    }

    /// Makes every `fetch_dish` call for `dish_id` fail until cleared.
    pub fn fail_dish(&self, dish_id: impl Into<DishId>) {
        self.failing_dishes.lock().unwrap().insert(dish_id.into());
    }

    /// Clears a per-dish failure set by [`MockApi::fail_dish`].
    pub fn heal_dish(&self, dish_id: &str) {
        self.failing_dishes.lock().unwrap().remove(dish_id);
    }

    /// Adds an artificial delay to every `fetch_open_orders` call.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    /// Adds an artificial delay to every `update_order_status` call.
    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    /// Number of `fetch_open_orders` calls made so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Every dish id passed to `fetch_dish`, in call order.
    pub fn dish_calls(&self) -> Vec<DishId> {
        self.dish_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderApi for MockApi {
    async fn fetch_open_orders(&self, branch_id: &BranchId) -> Result<Vec<PlacedOrder>, ApiError> {
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Network("connection reset".into()));
        }
        let backend = self.backend.lock().unwrap();
        Ok(backend
            .orders
            .iter()
            .filter(|o| &o.branch_id == branch_id)
            .cloned()
            .collect())
    }

    async fn fetch_dish(
        &self,
        _branch_id: &BranchId,
        dish_id: &DishId,
    ) -> Result<DishDetails, ApiError> {
        self.dish_calls.lock().unwrap().push(dish_id.clone());
        if self.failing_dishes.lock().unwrap().contains(dish_id) {
            return Err(ApiError::Network(format!("dish {dish_id} unreachable")));
        }
        let backend = self.backend.lock().unwrap();
        backend
            .dishes
            .get(dish_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(dish_id.clone()))
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, ApiError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Network("connection reset".into()));
        }
        if order.lines.is_empty() {
            return Err(ApiError::Rejected("order has no lines".into()));
        }
        let id = format!("order_{}", self.next_order.fetch_add(1, Ordering::SeqCst));
        let total = order
            .lines
            .iter()
            .map(|l| l.unit_price * u64::from(l.quantity))
            .sum();
        let placed = PlacedOrder {
            id: id.clone(),
            branch_id: order.branch_id,
            table_number: order.table_number,
            lines: order.lines,
            total,
            status: OrderStatus::Confirmed,
            created_at: Utc::now(),
        };
        self.backend.lock().unwrap().orders.push(placed);
        Ok(id)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<PlacedOrder, ApiError> {
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next_status.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Network("connection reset".into()));
        }
        let mut backend = self.backend.lock().unwrap();
        let order = backend
            .orders
            .iter_mut()
            .find(|o| &o.id == order_id)
            .ok_or_else(|| ApiError::NotFound(order_id.clone()))?;
        if order.status.next() != Some(target) {
            return Err(ApiError::Rejected(format!(
                "illegal transition {} -> {}",
                order.status, target
            )));
        }
        order.status = target;
        Ok(order.clone())
    }
}
