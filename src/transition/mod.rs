//! Staff-initiated order status transitions.
//!
//! The transition itself is executed by the feed task (see [`crate::feed`]);
//! this module holds the adjacency rule, the per-order in-flight marker set,
//! and the error type shared between the two.

pub mod error;

pub use error::*;

use std::collections::HashSet;

use crate::model::{OrderId, OrderStatus};

/// Rejects any target that is not the immediate successor of `current`.
///
/// The server applies the same rule authoritatively; checking locally avoids
/// a round-trip for requests that can never succeed.
pub fn validate_transition(
    current: OrderStatus,
    target: OrderStatus,
) -> Result<(), TransitionError> {
    if current.next() == Some(target) {
        Ok(())
    } else {
        Err(TransitionError::NotAdjacent {
            from: current,
            to: target,
        })
    }
}

/// Per-order in-flight markers.
///
/// A set keyed by order id rather than one global flag: multiple orders may
/// be transitioned in overlapping time windows, and only repeat submissions
/// for the *same* order are blocked.
#[derive(Debug, Clone, Default)]
pub struct InFlightMarkers {
    orders: HashSet<OrderId>,
}

impl InFlightMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `order_id` in flight, or fails if a request for it is already
    /// outstanding.
    pub fn acquire(&mut self, order_id: &OrderId) -> Result<(), TransitionError> {
        if self.orders.insert(order_id.clone()) {
            Ok(())
        } else {
            Err(TransitionError::InFlight(order_id.clone()))
        }
    }

    /// Clears the marker for `order_id`, on success and failure alike.
    pub fn release(&mut self, order_id: &OrderId) {
        self.orders.remove(order_id);
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains(order_id)
    }

    pub fn snapshot(&self) -> HashSet<OrderId> {
        self.orders.clone()
    }
}
