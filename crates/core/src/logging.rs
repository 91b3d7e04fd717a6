//! Tracing subscriber setup for the binary.

#[cfg(feature = "trace")]
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LedgerConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// is harmless: the second installation is ignored.
#[cfg(feature = "trace")]
pub fn init_tracing(config: &LedgerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_config: &LedgerConfig) {}
