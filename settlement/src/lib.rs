//! Quitanda Settlement Engine
//!
//! Splits a completed order's payment into vendor/driver/platform shares,
//! credits the parties' ledger-backed wallets, and records platform revenue,
//! all in one atomic unit.
//!
//! # Architecture
//!
//! 1. **Recording**: the payment webhook records one confirmed transaction
//!    per order
//! 2. **Splitting**: a pure calculator computes the share amounts with exact
//!    decimal arithmetic
//! 3. **Settlement**: the orchestrator writes the payout, wallet credits and
//!    platform revenue atomically; the payout record is the idempotency
//!    anchor
//! 4. **Extracts**: a read-only service serves balances and movement history
//!
//! # Example
//!
//! ```no_run
//! use settlement::{Config, SettlementEngine};
//!
//! #[tokio::main]
//! async fn main() -> settlement::Result<()> {
//!     let engine = SettlementEngine::open(Config::default())?;
//!
//!     // On delivery completion:
//!     // let payout = engine.settle_order(&order, &transaction).await?;
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod recorder;
pub mod split;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use extract::ExtractService;
pub use recorder::TransactionRecorder;
pub use split::compute_split;
pub use types::{CompletedOrder, OrderStatus, SplitAmounts, SplitRates};
