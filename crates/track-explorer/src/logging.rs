//! Logging initialization.
//!
//! Logs go to stderr so that stdout stays clean for (JSON) results.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter directive for the given `-v` count
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info,track_catalog_lib=info",
        _ => "debug",
    }
}

/// Initialize logging; `RUST_LOG` wins over the verbosity flag when set.
pub fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(fmt_layer);

    if let Err(e) = registry.try_init() {
        eprintln!("Logging already initialized: {e}");
        return;
    }

    tracing::debug!("Logging initialized");
}
