use serde::{Deserialize, Serialize};

use crate::model::DishId;

/// One selection in a customer's pending cart.
///
/// Unique by `dish_id` within a cart: adding the same dish again collapses
/// into the existing entry's quantity. The name and price are captured from
/// the dish at add time so the cart renders without a network round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub dish_id: DishId,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: u64,
    pub quantity: u32,
}

impl CartEntry {
    /// The line subtotal (`price × quantity`).
    pub fn subtotal(&self) -> u64 {
        self.price * u64::from(self.quantity)
    }
}
