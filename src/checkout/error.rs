//! Error types for order placement.

use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced to the customer at checkout.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlacementError {
    /// Caught locally before any network call; no state is mutated.
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    /// The server rejected or never received the order. The cart is
    /// retained so the user can retry explicitly.
    #[error("order placement failed: {0}")]
    Api(#[from] ApiError),
}
