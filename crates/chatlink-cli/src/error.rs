//! Error handling for the chatlink CLI

use thiserror::Error;

use crate::config::ConfigError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Chatlink(#[from] chatlink_core::ChatlinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State persistence error: {0}")]
    StatePersistence(String),

    #[error("Not signed in. Run `chatlink login` first")]
    NotSignedIn,

    #[error("No sign-up is waiting for verification. Run `chatlink signup` first")]
    NoPendingVerification,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::StatePersistence(format!("{:#}", err))
    }
}
