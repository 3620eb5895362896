//! Error types for the structure signals strategy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl StrategyError {
    pub fn configuration(message: impl Into<String>) -> Self {
        StrategyError::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
