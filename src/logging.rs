//! Tracing setup for programs embedding logshape

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to `logshape=info`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logshape=info"));

    if fmt().with_env_filter(filter).with_target(false).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
