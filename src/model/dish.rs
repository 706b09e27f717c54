use serde::{Deserialize, Serialize};

/// Branch-scoped identifier for a sellable dish, distinct from the
/// system-wide menu item it derives from.
pub type DishId = String;

/// Identifier for a single restaurant location.
pub type BranchId = String;

/// Display metadata for one branch-scoped dish, as returned by the
/// dish-reference read endpoint.
///
/// Entries are immutable once fetched for the lifetime of a staff session:
/// the [`DishCache`](crate::dish_cache::DishCache) adds them and never
/// removes or replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishDetails {
    pub id: DishId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Unit price in minor currency units.
    pub price: u64,
    pub available: bool,
}

impl DishDetails {
    pub fn new(id: impl Into<DishId>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image_url: None,
            price,
            available: true,
        }
    }
}
