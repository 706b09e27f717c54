//! Error types for the order feed.

use thiserror::Error;

/// Errors surfaced by [`FeedHandle`](crate::feed::FeedHandle) operations.
///
/// Fetch failures never appear here: they are transient by design and land
/// in [`FeedSnapshot::last_error`](crate::feed::FeedSnapshot) instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    /// The feed task has shut down and no longer accepts commands.
    #[error("feed is no longer running")]
    Closed,
}
