//! Common error types for TaxPilot

use thiserror::Error;

/// Common result type for TaxPilot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TaxPilot services
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user input or request parameter (negative amounts, bad status strings)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A compute was requested before the session had enough information
    #[error("Incomplete session: {0}")]
    IncompleteSession(String),

    /// A deduction lookup happened before the filing status was declared
    #[error("Filing status not yet declared")]
    MissingFilingStatus,

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote reasoning service failed or timed out; callers recover locally
    #[error("Remote agent unavailable: {0}")]
    RemoteUnavailable(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
