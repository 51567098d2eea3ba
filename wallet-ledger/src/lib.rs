//! Quitanda Wallet Ledger
//!
//! Ledger-backed wallets for marketplace drivers, vendors, and customers.
//!
//! # Architecture
//!
//! - **Append-only movements**: every balance change is an immutable entry
//! - **Cached balances**: the wallet balance is a cache over its history,
//!   committed in the same atomic batch as each movement
//! - **Unit of work**: multi-wallet mutations stage into one RocksDB batch
//!   and commit or roll back together
//! - **Per-wallet locking**: concurrent mutations of one wallet serialize
//!
//! # Invariants
//!
//! - Reconciliation: balance == Σ(signed movement amounts) for all time
//! - No negative balances: overdrawing debits are rejected, never clamped
//! - Append-only: movements are never modified or deleted

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{LedgerStore, LedgerUnit};
pub use metrics::Metrics;
pub use storage::Storage;
pub use types::{
    Direction, Movement, MovementKind, OwnerId, OwnerType, PaymentMethod, Payout, PayoutStatus,
    PlatformRevenue, RevenueSource, Transaction, TransactionStatus, Wallet, WalletExtract,
};
