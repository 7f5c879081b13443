//! Log output for applications and tests.

use tracing_subscriber::EnvFilter;

/// Variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "HEARTH_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a formatting subscriber filtered by `HEARTH_LOG`, then
/// `RUST_LOG`, then `info`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialized");
    }
    installed
}
