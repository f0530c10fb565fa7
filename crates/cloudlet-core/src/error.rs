//! Error types for cloudlet core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CloudletError>;

/// Core error type for cloudlet operations
#[derive(Error, Debug)]
pub enum CloudletError {
    #[error("Invalid cloudlet endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Provisioning error: {0}")]
    Provisioning(String),
}
