//! Simple daemon error types

use sentinel_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] CoreError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] hyper::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DaemonError>;
