#![forbid(unsafe_code)]

//! Tracing subscriber setup for the CLI.
//!
//! Library crates only emit events; installing a subscriber is left to the
//! binary. Events go to stderr so stdout carries nothing but the verdict.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the global subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Subsequent calls are ignored.
pub fn init_tracing() {
    init_tracing_with("info");
}

/// [`init_tracing`] with another default level.
pub fn init_tracing_with(default: &str) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        let _ = tracing_subscriber::registry()
            .with(env_filter(default))
            .with(fmt_layer)
            .try_init();
    });
}

/// Initialize tracing with one JSON object per event.
pub fn init_tracing_json() {
    init_tracing_json_with("info");
}

pub fn init_tracing_json_with(default: &str) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true);
        let _ = tracing_subscriber::registry()
            .with(env_filter(default))
            .with(fmt_layer)
            .try_init();
    });
}
