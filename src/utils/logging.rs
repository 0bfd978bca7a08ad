//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::Env;

/// Initialize `env_logger`, honoring `RUST_LOG` and defaulting to `info`.
///
/// Later calls are no-ops.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
