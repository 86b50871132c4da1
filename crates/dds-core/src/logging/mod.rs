//! Structured logging foundation for dds-core.
//!
//! The sampler only emits `tracing` events; installing a subscriber is the
//! host's call. Hosts without their own subscriber can use
//! [`init_logging`] to get either human-readable or JSONL output on stderr.
//!
//! # Usage
//!
//! ```no_run
//! use dds_core::logging::{init_logging, LevelFilter, LogConfig};
//!
//! let config = LogConfig::from_env(Some(LevelFilter::DEBUG), None);
//! init_logging(&config);
//! ```
//!
//! # Events
//!
//! - `debug`: one event per readjustment carrying the full computed
//!   snapshot, plus reset/configure notices
//! - `warn`: a caller-supplied timestamp went backwards (once per reset)

pub mod config;

pub use config::{LogConfig, LogFormat};
pub use tracing_subscriber::filter::LevelFilter;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Standard event names attached to every sampler log line as `event`.
pub mod event_names {
    pub const SAMPLER_RESET: &str = "sampler.reset";
    pub const SAMPLER_CONFIGURED: &str = "sampler.configured";
    pub const SAMPLER_READJUSTED: &str = "sampler.readjusted";
    pub const CLOCK_REGRESSION: &str = "sampler.clock_regression";
}

/// RUST_LOG is used verbatim only when neither DDS_LOG nor the host chose a level.
fn env_filter(config: &LogConfig) -> EnvFilter {
    if !config.defer_to_rust_log {
        return EnvFilter::new(config.directive());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()))
}

/// Install a global stderr subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn try_init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = env_filter(config);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    }
}

/// Install a global stderr subscriber.
///
/// Must be called at most once; a second call logs a warning to stderr and
/// keeps the existing subscriber.
pub fn init_logging(config: &LogConfig) {
    if let Err(err) = try_init_logging(config) {
        eprintln!("Warning: logging already initialized: {}", err);
    }
}

/// Initialize logging with defaults (for tests and simple hosts).
pub fn init_default_logging() {
    init_logging(&LogConfig::from_env(None, None));
}
