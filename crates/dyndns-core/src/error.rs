//! Error types for the dynamic DNS monitor
//!
//! This module defines all error types used throughout the crate.
//!
//! - [`ResolutionError`]: the IP resolver could not produce an address
//! - [`UpdateError`]: the provider adapter could not apply an update
//! - [`Error`]: crate-level errors (configuration, stores, lifecycle)

use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a public IP resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Every candidate endpoint was unreachable or returned unparsable content
    #[error("all {attempts} IP detection endpoints failed")]
    AllEndpointsFailed {
        /// Number of endpoints that were tried
        attempts: usize,
    },
}

/// Failure of a DNS provider update
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// Domain, identifier or secret is empty. Never retried automatically.
    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    /// The provider answered with a non-2xx status
    #[error("provider rejected update (HTTP {status}): {body}")]
    ProviderRejected {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body, or a message when the body could not be read
        body: String,
    },

    /// No response was received from the provider
    #[error("network failure: {message}")]
    NetworkFailure {
        /// Transport error description
        message: String,
    },
}

impl UpdateError {
    /// Create a missing-parameters error
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::MissingParameters(msg.into())
    }

    /// Create a network failure error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: msg.into(),
        }
    }

    /// HTTP-equivalent classification for upstream reporting
    ///
    /// Missing parameters map to 400, rejections keep the provider's status and
    /// network failures are reported as 500.
    pub fn status_code(&self) -> u16 {
        match self {
            UpdateError::MissingParameters(_) => 400,
            UpdateError::ProviderRejected { status, .. } => *status,
            UpdateError::NetworkFailure { .. } => 500,
        }
    }

    /// Whether the next scheduled cycle should re-issue the update
    pub fn is_transient(&self) -> bool {
        matches!(self, UpdateError::NetworkFailure { .. })
    }
}

/// Core error type for the monitor
#[derive(Error, Debug)]
pub enum Error {
    /// IP resolution errors
    #[error("IP resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// DNS provider update errors
    #[error("DNS update error: {0}")]
    Update(#[from] UpdateError),

    /// Configuration store errors
    #[error("Config store error: {0}")]
    ConfigStore(String),

    /// Log sink errors
    #[error("Log sink error: {0}")]
    LogSink(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `start()` was called while the periodic timer is active
    #[error("Monitor is already running")]
    AlreadyRunning,

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config store error
    pub fn config_store(msg: impl Into<String>) -> Self {
        Self::ConfigStore(msg.into())
    }

    /// Create a log sink error
    pub fn log_sink(msg: impl Into<String>) -> Self {
        Self::LogSink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
