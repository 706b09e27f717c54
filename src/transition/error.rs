//! Error types for status transitions.

use thiserror::Error;

use crate::api::ApiError;
use crate::model::{OrderId, OrderStatus};

/// Errors surfaced to staff when advancing an order's status.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    /// The target is not the immediate successor of the last observed
    /// status. Rejected locally; client state is unchanged.
    #[error("illegal transition {from} -> {to}")]
    NotAdjacent { from: OrderStatus, to: OrderStatus },

    /// A transition request for this order is already outstanding.
    #[error("a transition for order {0} is already in flight")]
    InFlight(OrderId),

    /// The order is not present in the current feed.
    #[error("order {0} is not in the current feed")]
    UnknownOrder(OrderId),

    /// The server refused or never received the request. The order stays in
    /// its last-known bucket; retry is left to the user.
    #[error("status update failed: {0}")]
    Api(#[from] ApiError),

    /// The feed task has shut down.
    #[error("feed is no longer running")]
    FeedClosed,
}
