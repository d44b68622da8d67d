//! Tracing subscriber set-up shared by the service binaries.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the JSON subscriber filtered by `RUST_LOG`.
///
/// Defaults to `info` when `RUST_LOG` is unset. A second call, or a
/// subscriber installed elsewhere, only logs a warning.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}
