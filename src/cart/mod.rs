//! The customer's pending selections before an order exists.
//!
//! [`CartStore`] is plain session-owned state over the durable
//! [`KeyValueStore`]: every mutation persists the full entry list before
//! returning, and the in-memory state stays authoritative even when
//! persistence silently fails. Entries keep insertion order for display and
//! are unique by dish id.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{CartEntry, DishDetails};
use crate::storage::{KeyValueStore, CART_KEY};

/// The customer cart, rehydrated from storage at session start.
pub struct CartStore {
    entries: Vec<CartEntry>,
    store: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Loads the persisted cart, treating any read or decode failure as an
    /// empty cart.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = match store.get(CART_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Persisted cart is unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Cart storage read failed, starting empty");
                Vec::new()
            }
        };
        Self { entries, store }
    }

    /// Adds `quantity` of `dish`, merging into an existing entry for the
    /// same dish id.
    pub fn add_item(&mut self, dish: &DishDetails, quantity: u32) {
        let quantity = quantity.max(1);
        match self.entries.iter_mut().find(|e| e.dish_id == dish.id) {
            Some(entry) => entry.quantity += quantity,
            None => self.entries.push(CartEntry {
                dish_id: dish.id.clone(),
                name: dish.name.clone(),
                price: dish.price,
                quantity,
            }),
        }
        debug!(dish_id = %dish.id, quantity, "Cart add");
        self.persist();
    }

    /// Replaces the quantity for `dish_id`. Zero removes the entry; an
    /// absent id is a no-op.
    pub fn update_quantity(&mut self, dish_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(dish_id);
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.dish_id == dish_id) {
            entry.quantity = quantity;
            self.persist();
        }
    }

    /// Removes the entry for `dish_id` if present. Idempotent.
    pub fn remove_item(&mut self, dish_id: &str) {
        let before = self.entries.len();
        self.entries.retain(|e| e.dish_id != dish_id);
        if self.entries.len() != before {
            self.persist();
        }
    }

    /// Empties the cart and persists the empty state. Called exactly once,
    /// immediately after a successful order placement.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Sum of all entry quantities.
    pub fn item_count(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// Sum of `price × quantity` over all entries, in minor units.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(CartEntry::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current entries in insertion order.
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.entries) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Cart serialization failed, skipping persist");
                return;
            }
        };
        // In-memory state stays authoritative when the write fails.
        if let Err(e) = self.store.set(CART_KEY, &raw) {
            warn!(error = %e, "Cart storage write failed");
        }
    }
}
