//! Session wiring and observability setup.
//!
//! [`BranchSession`] is the explicit context object that replaces ambient
//! globals: it owns the storage handle, the API client, the rehydrated cart,
//! and the session identity, and it is the factory for feed instances.

pub mod session;
pub mod tracing;

pub use session::*;
pub use self::tracing::setup_tracing;
