//! Error type for the server boundary.

use thiserror::Error;

/// Errors surfaced by [`OrderApi`](crate::api::OrderApi) implementations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The request never produced a usable response (connectivity, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server understood the request and refused it.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The referenced resource does not exist on the server.
    #[error("not found: {0}")]
    NotFound(String),
}
