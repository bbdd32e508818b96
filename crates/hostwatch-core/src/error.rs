//! Error types for Hostwatch

use thiserror::Error;

use crate::alerting::NotifyError;
use crate::sampler::SampleError;

/// Result type alias using Hostwatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Hostwatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    /// Metrics could not be sampled
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// Alert could not be delivered
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
