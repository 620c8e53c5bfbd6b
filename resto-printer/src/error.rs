//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Device is not registered with the print queue
    #[error("Printer not found: {0}")]
    DeviceNotFound(String),

    /// Print queue rejected or failed the job
    #[error("Spool error: {0}")]
    Spool(String),

    /// IO error while talking to the spooler
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for the spooler
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Logo could not be loaded or decoded
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
