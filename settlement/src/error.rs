//! Error types for the settlement engine

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] wallet_ledger::Error),

    /// Order fails a settlement precondition
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Split rate table is malformed
    #[error("Invalid rates: {0}")]
    InvalidRates(String),

    /// A conflicting transaction already exists for this order
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// The atomic settlement unit could not commit; safe to retry
    #[error("Settlement failed: {0}")]
    SettlementFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
