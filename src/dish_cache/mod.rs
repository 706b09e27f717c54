//! Memoizing lookup from branch-scoped dish ids to display metadata.
//!
//! The cache is populated lazily from the orders each poll cycle returns and
//! shared across every concurrently rendered order card. Entries are
//! immutable once stored and never evicted within a session; "unresolved"
//! and "errored" are the same state, retried on the next cycle.
//!
//! The diff step ([`DishCache::unresolved_ids`]) is a pure function of the
//! cache and a fetched batch, so reconciliation is testable without a live
//! network. Batch resolution fans out one fetch per unique unresolved id and
//! merges the survivors as a single atomic batch once all fetches settle.

use std::collections::HashMap;

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::api::OrderApi;
use crate::model::{BranchId, DishDetails, DishId, PlacedOrder};

/// Session-lived dish metadata cache. Add-only; one entry per unique id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DishCache {
    entries: HashMap<DishId, DishDetails>,
}

impl DishCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached dish. `None` renders as a placeholder until a later
    /// poll cycle resolves the id.
    pub fn get(&self, dish_id: &str) -> Option<&DishDetails> {
        self.entries.get(dish_id)
    }

    pub fn contains(&self, dish_id: &str) -> bool {
        self.entries.contains_key(dish_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The unique dish ids referenced by `orders` that are not yet cached,
    /// in first-seen order.
    pub fn unresolved_ids(&self, orders: &[PlacedOrder]) -> Vec<DishId> {
        let mut seen: Vec<DishId> = Vec::new();
        for order in orders {
            for line in &order.lines {
                if !self.entries.contains_key(&line.dish_id)
                    && !seen.contains(&line.dish_id)
                {
                    seen.push(line.dish_id.clone());
                }
            }
        }
        seen
    }

    /// Merges a resolved batch into the cache.
    ///
    /// Entries are immutable once set: an id that is already cached keeps
    /// its existing entry, so re-resolving is a safe no-op.
    pub fn merge(&mut self, batch: HashMap<DishId, DishDetails>) {
        for (id, dish) in batch {
            self.entries.entry(id).or_insert(dish);
        }
    }
}

/// Fetches every id in `ids` in parallel, one task per id, and returns the
/// successes as one batch.
///
/// A failed fetch does not abort the rest; the failed id is simply absent
/// from the result and will be retried on the next poll cycle.
pub async fn resolve_batch(
    api: Arc<dyn OrderApi>,
    branch_id: BranchId,
    ids: Vec<DishId>,
) -> HashMap<DishId, DishDetails> {
    let mut tasks = JoinSet::new();
    for dish_id in ids {
        let api = api.clone();
        let branch_id = branch_id.clone();
        tasks.spawn(async move {
            let result = api.fetch_dish(&branch_id, &dish_id).await;
            (dish_id, result)
        });
    }

    let mut batch = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(dish))) => {
                batch.insert(id, dish);
            }
            Ok((id, Err(e))) => {
                debug!(dish_id = %id, error = %e, "Dish resolution failed, will retry next cycle");
            }
            Err(e) => {
                debug!(error = %e, "Dish resolution task aborted");
            }
        }
    }
    batch
}
