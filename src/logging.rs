//! Logging initialisation.
//!
//! duckframe only emits `tracing` events; installing a subscriber is left to
//! the application. [`init_logging`] is a convenience for binaries and tests
//! that do not set one up themselves.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise the filter is `warn`, raised to
/// `debug` for duckframe's own targets when `verbose` is set.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(verbose: bool) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(log_filter(verbose))
        .try_init()
        .is_ok()
}

fn log_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
