//! Logging setup
//!
//! Library code only emits `tracing` events; binaries and tests decide where
//! they go by calling `init_tracing` once at startup.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`
///
/// Falls back to `default_directive` (e.g. `"info"` or
/// `"studyhub_core=debug"`) when `RUST_LOG` is unset or invalid. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A subscriber may already be installed (tests, embedding apps)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
