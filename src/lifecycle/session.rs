use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::OrderApi;
use crate::cart::CartStore;
use crate::checkout::{self, PlacementError};
use crate::feed::{FeedConfig, FeedHandle, OrderFeed};
use crate::model::{BranchId, OrderId, PaymentMethod};
use crate::storage::{KeyValueStore, SESSION_KEY};

/// What the signed-in user is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    BranchAdmin,
    SuperAdmin,
}

/// The persisted session identity, read once at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

/// One user session against one restaurant platform backend.
///
/// Owns the dependencies the core needs (storage, API client) and the
/// session-scoped state (identity, cart). Created with an explicit
/// rehydrate-from-storage init and torn down with [`BranchSession::logout`];
/// nothing here is a process-wide singleton.
pub struct BranchSession {
    api: Arc<dyn OrderApi>,
    store: Arc<dyn KeyValueStore>,
    identity: Option<SessionIdentity>,
    pub cart: CartStore,
}

impl BranchSession {
    /// Rehydrates a session from durable storage.
    ///
    /// Unreadable or missing identity degrades to a signed-out session; the
    /// cart likewise degrades to empty. Neither failure is surfaced.
    pub fn init(api: Arc<dyn OrderApi>, store: Arc<dyn KeyValueStore>) -> Self {
        let identity = match store.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<SessionIdentity>(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!(error = %e, "Persisted session is unreadable, starting signed out");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Session storage read failed, starting signed out");
                None
            }
        };
        let cart = CartStore::load(store.clone());
        Self {
            api,
            store,
            identity,
            cart,
        }
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    /// Records the signed-in identity and persists it. A failed write is
    /// swallowed; the in-memory identity stays authoritative.
    pub fn login(&mut self, identity: SessionIdentity) {
        info!(user_id = %identity.user_id, role = ?identity.role, "Session started");
        match serde_json::to_string(&identity) {
            Ok(raw) => {
                if let Err(e) = self.store.set(SESSION_KEY, &raw) {
                    warn!(error = %e, "Session storage write failed");
                }
            }
            Err(e) => warn!(error = %e, "Session serialization failed"),
        }
        self.identity = Some(identity);
    }

    /// Clears the identity and its persisted record.
    pub fn logout(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(user_id = %identity.user_id, "Session ended");
        }
        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!(error = %e, "Session storage remove failed");
        }
    }

    /// Submits the current cart as an order for `branch_id`. See
    /// [`checkout::place_order`] for the failure contract.
    pub async fn place_order(
        &mut self,
        branch_id: BranchId,
        table_number: Option<u32>,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<OrderId, PlacementError> {
        checkout::place_order(
            self.api.as_ref(),
            &mut self.cart,
            branch_id,
            table_number,
            payment_method,
            notes,
        )
        .await
    }

    /// Starts the staff order feed for `branch_id`.
    ///
    /// The returned handle owns the polling lifecycle; dropping it or
    /// calling [`FeedHandle::shutdown`] stops the feed deterministically.
    pub fn start_feed(&self, branch_id: BranchId, config: FeedConfig) -> FeedHandle {
        OrderFeed::spawn(self.api.clone(), branch_id, config)
    }
}
