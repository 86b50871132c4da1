//! Logging configuration.
//!
//! Supports configuration via:
//! - Environment variables (DDS_LOG, RUST_LOG, DDS_LOG_FORMAT)
//! - Explicit overrides from the embedding host

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Logging configuration.
///
/// `DEBUG` includes one event per readjustment window; clock regressions
/// are reported at `WARN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LevelFilter,
    /// Whether to include timestamps in human output.
    pub timestamps: bool,
    /// When set, an installed subscriber takes its filter from RUST_LOG
    /// verbatim. Cleared once DDS_LOG or an explicit override picks `level`.
    pub defer_to_rust_log: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            timestamps: true,
            defer_to_rust_log: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment and explicit overrides.
    pub fn from_env(level: Option<LevelFilter>, format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), level, format)
    }

    /// Same as [`LogConfig::from_env`], reading variables through `lookup`.
    ///
    /// DDS_LOG must be a bare level. RUST_LOG may be a full directive list;
    /// `level` records its most verbose level.
    pub fn from_lookup<F>(lookup: F, level: Option<LevelFilter>, format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(val) = lookup("DDS_LOG") {
            if let Ok(level) = val.trim().parse::<LevelFilter>() {
                config.level = level;
                config.defer_to_rust_log = false;
            }
        } else if let Some(val) = lookup("RUST_LOG") {
            if let Some(level) = most_verbose_level(&val) {
                config.level = level;
            }
        }

        if let Some(val) = lookup("DDS_LOG_FORMAT") {
            if let Ok(format) = val.parse::<LogFormat>() {
                config.format = format;
            }
        }

        if let Some(level) = level {
            config.level = level;
            config.defer_to_rust_log = false;
        }
        if let Some(format) = format {
            config.format = format;
        }

        config
    }

    /// Filter directive for this crate, e.g. `dds_core=debug`.
    pub fn directive(&self) -> String {
        format!("dds_core={}", self.level.to_string().to_lowercase())
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self.defer_to_rust_log = false;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

/// Most verbose level named by a `RUST_LOG`-style directive list.
///
/// Each comma-separated directive is either a bare level or
/// `target[span]=level`; target names are never read as levels.
fn most_verbose_level(directives: &str) -> Option<LevelFilter> {
    directives
        .split(',')
        .filter_map(|directive| {
            let level = directive.rsplit('=').next().unwrap_or(directive).trim();
            // An empty string parses as ERROR.
            if level.is_empty() {
                return None;
            }
            level.parse::<LevelFilter>().ok()
        })
        .max()
}
