use thiserror::Error;

/// Canonical error type for load test construction and analysis.
///
/// Per-request failures never surface through this type: they are captured
/// inside [`RequestResult`](crate::RequestResult) instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration was rejected before any load was generated.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable explanation of the rejected value.
        message: String,
    },

    /// Operation violates the controller state machine.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Human-readable explanation of the invalid state.
        message: String,
    },

    /// I/O error occurred while reading or writing reports.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error occurred.
    #[error("deserialization error: {0}")]
    DeserializationError(String),
}

impl CoreError {
    /// Creates an `InvalidConfig` variant.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an `InvalidState` variant.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_eof() || err.is_syntax() {
            Self::DeserializationError(err.to_string())
        } else {
            Self::SerializationError(err.to_string())
        }
    }
}

/// Failure raised by a [`LoadTarget`](crate::LoadTarget) while serving a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    /// Target refused or failed the request.
    #[error("request failed: {0}")]
    Failed(String),

    /// Target is saturated and shed the request.
    #[error("target overloaded: {0}")]
    Overloaded(String),

    /// Response stream broke off before completion.
    #[error("response stream interrupted: {0}")]
    Stream(String),
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
