//! Converting a cart snapshot into a placed order.
//!
//! Placement is the only point where the cart and the server boundary meet:
//! an empty cart is rejected locally with no network call, a server failure
//! leaves the cart untouched so the user can retry, and only a confirmed
//! success clears the cart.

pub mod error;

pub use error::*;

use tracing::{debug, info, warn};

use crate::api::OrderApi;
use crate::cart::CartStore;
use crate::model::{BranchId, NewOrder, OrderId, OrderLine, PaymentMethod};

/// Submits the current cart as a new order for `branch_id`.
///
/// On success the cart is cleared and the allocated order id returned; on
/// failure the cart is byte-for-byte unchanged and retry is left to the
/// user. No automatic retry is performed here.
pub async fn place_order(
    api: &dyn OrderApi,
    cart: &mut CartStore,
    branch_id: BranchId,
    table_number: Option<u32>,
    payment_method: PaymentMethod,
    notes: Option<String>,
) -> Result<OrderId, PlacementError> {
    if cart.is_empty() {
        return Err(PlacementError::EmptyCart);
    }

    let lines: Vec<OrderLine> = cart
        .entries()
        .iter()
        .map(|e| OrderLine {
            dish_id: e.dish_id.clone(),
            quantity: e.quantity,
            unit_price: e.price,
        })
        .collect();
    let order = NewOrder {
        branch_id,
        table_number,
        payment_method,
        notes,
        lines,
    };

    debug!(items = cart.item_count(), total = cart.total(), "Placing order");
    match api.create_order(order).await {
        Ok(order_id) => {
            info!(%order_id, "Order placed");
            cart.clear();
            Ok(order_id)
        }
        Err(e) => {
            warn!(error = %e, "Order placement failed, cart retained");
            Err(PlacementError::Api(e))
        }
    }
}
