//! Log output setup

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Filter from `RUST_LOG`, falling back to `default`
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the fmt subscriber for the process
///
/// Returns `false` when a global subscriber was already installed (tests,
/// embedding applications); the existing one stays in place.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(false)
        .try_init()
        .is_ok()
}
