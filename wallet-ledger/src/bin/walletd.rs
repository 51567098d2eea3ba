//! Wallet ledger daemon binary

use std::error::Error;
use wallet_ledger::{Config, LedgerStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Quitanda wallet ledger");

    // Load configuration
    let config = Config::from_env()?;

    // Open store
    let ledger = LedgerStore::open(config)?;
    let stats = ledger.stats()?;
    tracing::info!(
        wallets = stats.total_wallets,
        movements = stats.total_movements,
        payouts = stats.total_payouts,
        "Ledger store opened"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down wallet ledger");
    ledger.close()?;
    Ok(())
}
