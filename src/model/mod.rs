//! Pure data structures shared across the synchronization core.

pub mod cart;
pub mod dish;
pub mod order;

pub use cart::*;
pub use dish::*;
pub use order::*;
