//! Tracing initialization.
//!
//! Structured, async-aware logging via `tracing` and `tracing-subscriber`.
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! `log_level`, so a deployed recorder and an ad-hoc debug session use the
//! same code path.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber from a filter directive.
///
/// `directive` is a `tracing-subscriber` filter string, e.g. `"info"` or
/// `"force_daq=debug"`. Safe to call more than once; later calls are no-ops.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init so tests that each set up logging don't fight over the
    // global subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
