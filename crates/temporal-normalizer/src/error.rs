//! Error types for temporal-normalizer operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Time service transport error: {0}")]
    Transport(String),

    #[error("Time service returned status {0}")]
    Status(u16),

    #[error("Time service response could not be decoded: {0}")]
    Decode(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// True for failures of the outbound call to the time-parsing service.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status(_) | Self::Decode(_)
        )
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
