//! Tracing subscriber setup.
//!
//! Structured logging with `tracing`: `info` for lifecycle events (feed
//! start/stop, placed orders, applied transitions), `debug` for request
//! flow, `warn` for swallowed failures (storage writes, fetch errors).
//! Log levels are configured via the `RUST_LOG` environment variable, e.g.
//!
//! ```bash
//! RUST_LOG=info cargo test
//! RUST_LOG=branch_orders::feed=debug cargo test
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
