//! Gateway error types

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the speech service
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Connect error: {0}")]
    Connect(String),

    /// Non-zero `code` in an inbound frame. `message` is the raw frame text.
    #[error("Upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session cancelled")]
    Cancelled,

    #[error("No frame received within {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    /// Upstream error code, if this error came from the remote service
    pub fn upstream_code(&self) -> Option<i64> {
        match self {
            GatewayError::Upstream { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Protocol(e.to_string())
    }
}

/// Speech recognition failure
#[derive(Error, Debug)]
#[error("Speech recognition failed: {cause}")]
pub struct AsrError {
    #[from]
    cause: GatewayError,
}

impl AsrError {
    pub fn cause(&self) -> &GatewayError {
        &self.cause
    }

    pub fn into_cause(self) -> GatewayError {
        self.cause
    }
}

/// Speech synthesis failure
#[derive(Error, Debug)]
#[error("Speech synthesis failed: {cause}")]
pub struct TtsError {
    #[from]
    cause: GatewayError,
}

impl TtsError {
    pub fn cause(&self) -> &GatewayError {
        &self.cause
    }

    pub fn into_cause(self) -> GatewayError {
        self.cause
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
