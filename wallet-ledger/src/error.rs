//! Error types for the wallet ledger

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Non-positive or malformed monetary amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Debit exceeds available balance; never silently clamped
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount requested
        requested: Decimal,
        /// Balance available
        available: Decimal,
    },

    /// Wallet not found
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// Movement not found
    #[error("Movement not found: {0}")]
    MovementNotFound(String),

    /// A payout was already recorded for this order
    #[error("Payout already recorded for order {0}")]
    PayoutExists(Uuid),

    /// A transaction was already recorded for this order
    #[error("Transaction already recorded for order {0}")]
    TransactionExists(Uuid),

    /// Cached balance disagrees with the movement history
    #[error("Reconciliation failure: {0}")]
    Reconciliation(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
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
