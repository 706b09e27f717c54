//! # Branch Orders
//!
//! The order lifecycle synchronization core of a restaurant ordering
//! platform: how a customer's cart becomes a placed order, and how branch
//! staff observe and advance that order concurrently with the backend via
//! interval polling — reconciling optimistic local state, cached dish
//! metadata, and partial failures without losing or duplicating state.
//!
//! ## Architecture
//!
//! State that multiple logical operations touch concurrently is owned by a
//! single Tokio task and driven through message channels; everything else is
//! plain session-owned data. No locks guard feed state, because only the
//! feed task writes it.
//!
//! - [`cart`] — the customer's pending selections, persisted to durable
//!   client storage on every mutation and rehydrated at session start.
//! - [`checkout`] — turns a cart snapshot plus branch/payment choice into a
//!   placed order; the cart is cleared only after the server confirms.
//! - [`dish_cache`] — lazy, add-only cache from branch-scoped dish ids to
//!   display metadata, populated by parallel fan-out each poll cycle.
//! - [`feed`] — the polling task over one branch's open orders: full-list
//!   replacement every 10 seconds, coalesced manual refreshes, per-order
//!   transition markers, deterministic teardown.
//! - [`transition`] — the forward-only status rule (`CONFIRMED → PREPARING
//!   → READY`) and the in-flight marker set.
//! - [`api`] / [`storage`] — the external collaborator seams: the backend
//!   endpoints and the durable key-value store, with test doubles.
//! - [`lifecycle`] — the [`BranchSession`](lifecycle::BranchSession) context
//!   object wiring it all together, plus tracing setup.
//!
//! ## Failure model
//!
//! Fetch and dish-resolution failures are transient: stale state is
//! retained, a notification lands in the snapshot, and the next cycle
//! retries. Mutation failures (placement, transitions) roll local state back
//! to pre-attempt so an explicit user retry is always safe. Storage failures
//! are swallowed; the session degrades to unpersisted state rather than
//! crashing.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod dish_cache;
pub mod feed;
pub mod lifecycle;
pub mod model;
pub mod storage;
pub mod transition;
