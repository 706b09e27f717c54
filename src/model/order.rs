use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BranchId, DishId};

/// Server-allocated order identifier.
pub type OrderId = String;

/// Lifecycle status of a placed order, as seen by branch staff.
///
/// Transitions are forward-only: `Confirmed → Preparing → Ready`. `Ready` is
/// terminal from the staff perspective; payment and completion happen outside
/// this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Confirmed,
    Preparing,
    Ready,
}

impl OrderStatus {
    /// The immediate successor status, or `None` for the terminal state.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
        };
        f.write_str(s)
    }
}

/// One line of a placed order: a dish reference plus the quantity and the
/// unit price captured at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub dish_id: DishId,
    pub quantity: u32,
    /// Unit price in minor currency units, frozen at placement time.
    pub unit_price: u64,
}

/// A server-owned order. The client holds a read-only projection: only the
/// server mutates it, in response to a transition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub branch_id: BranchId,
    pub table_number: Option<u32>,
    pub lines: Vec<OrderLine>,
    /// Monetary total in minor currency units.
    pub total: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Payment method chosen by the customer at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Qris,
}

/// Payload for the order-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub branch_id: BranchId,
    pub table_number: Option<u32>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// The staff dashboard partition of the open orders for one branch into
/// exactly three buckets by status.
///
/// Derived state: rebuilt from the latest feed snapshot on every poll cycle,
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffOrderView {
    pub confirmed: Vec<PlacedOrder>,
    pub preparing: Vec<PlacedOrder>,
    pub ready: Vec<PlacedOrder>,
}

impl StaffOrderView {
    /// Partitions `orders` by status, preserving their relative order.
    pub fn partition(orders: &[PlacedOrder]) -> Self {
        let mut view = StaffOrderView::default();
        for order in orders {
            match order.status {
                OrderStatus::Confirmed => view.confirmed.push(order.clone()),
                OrderStatus::Preparing => view.preparing.push(order.clone()),
                OrderStatus::Ready => view.ready.push(order.clone()),
            }
        }
        view
    }
}
