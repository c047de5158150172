//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! - `info`: stage progress and row counts
//! - `warn`: dropped records, positional column fallback
//! - `debug`: file sizes, connection lifecycle
//!
//! Cell values are never logged. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "pnr_loader=info";

/// Filter from `RUST_LOG`, or `DEFAULT_FILTER` (`debug` when verbose).
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pnr_loader=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    })
}

/// Install the global subscriber. Logs go to stderr so dry-run output stays clean.
pub fn init(verbose: bool) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .init();
}
