//! The server boundary of the synchronization core.
//!
//! Everything the core needs from the backend goes through the [`OrderApi`]
//! trait: the branch-scoped open-orders read, the dish-reference read, order
//! creation, and the status update. Production wires in an HTTP client; tests
//! use [`mock::MockApi`].

pub mod error;
pub mod mock;

pub use error::*;

use async_trait::async_trait;

use crate::model::{BranchId, DishDetails, DishId, NewOrder, OrderId, OrderStatus, PlacedOrder};

/// Backend endpoints consumed by the synchronization core.
///
/// Every method is an async boundary; callers render their last-known-good
/// state while a call is pending and convert failures into user-visible
/// notifications rather than letting them propagate.
#[async_trait]
pub trait OrderApi: Send + Sync + 'static {
    /// Fetches the full set of unresolved (not yet completed/paid) orders
    /// for one branch. Each response independently represents current full
    /// truth; the caller replaces its list wholesale.
    async fn fetch_open_orders(&self, branch_id: &BranchId) -> Result<Vec<PlacedOrder>, ApiError>;

    /// Fetches display metadata for one branch-scoped dish.
    async fn fetch_dish(&self, branch_id: &BranchId, dish_id: &DishId)
        -> Result<DishDetails, ApiError>;

    /// Submits a new order; the server allocates the identifier.
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, ApiError>;

    /// Requests a status advance for one order. The server is authoritative
    /// and rejects illegal jumps; on success it returns the updated order.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<PlacedOrder, ApiError>;
}
