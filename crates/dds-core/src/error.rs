//! Error types for the discrete dynamic sampler.
//!
//! Only configuration can fail. Sampling decisions, sample completion and
//! readjustment are total over their input domains and never return errors;
//! arithmetic edge cases are resolved by fixed policy inside the sampler.

use thiserror::Error;

/// Result type alias for sampler operations.
pub type Result<T> = std::result::Result<T, SamplerError>;

/// Unified error type for the sampler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    /// A configuration value is outside its valid range.
    ///
    /// The operation that produced this error has no effect on sampler state.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfiguration { field: String, message: String },

    /// A configuration document or environment override failed to parse.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl SamplerError {
    /// Shorthand for building an [`SamplerError::InvalidConfiguration`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SamplerError::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            SamplerError::InvalidConfiguration { .. } => 10,
            SamplerError::ConfigParse(_) => 11,
        }
    }

    /// Whether this error was caused by an out-of-range value.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, SamplerError::InvalidConfiguration { .. })
    }
}

impl From<toml::de::Error> for SamplerError {
    fn from(err: toml::de::Error) -> Self {
        SamplerError::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for SamplerError {
    fn from(err: serde_json::Error) -> Self {
        SamplerError::ConfigParse(err.to_string())
    }
}
