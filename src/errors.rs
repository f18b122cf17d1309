use std::result::Result as StdResult;

use thiserror::Error;

use crate::api::ApiError;

/// Unified error type for the domain, wizard, and config layers.
#[derive(Error, Debug)]
pub enum ClearingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Remote call failed: {0}")]
    Remote(String),
}

pub type Result<T> = StdResult<T, ClearingError>;

/// User-facing CLI error wrapper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ClearingError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<std::io::Error> for ClearingError {
    fn from(err: std::io::Error) -> Self {
        ClearingError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ClearingError {
    fn from(err: serde_json::Error) -> Self {
        ClearingError::Config(err.to_string())
    }
}

impl From<ApiError> for ClearingError {
    fn from(err: ApiError) -> Self {
        ClearingError::Remote(err.to_string())
    }
}
