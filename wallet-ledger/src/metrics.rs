//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `wallet_credits_total` - Total number of credit movements
//! - `wallet_debits_total` - Total number of debit movements
//! - `wallet_debits_rejected_total` - Debits rejected for insufficient funds
//! - `wallet_wallets_created_total` - Wallets created lazily
//! - `wallet_movement_amount` - Histogram of movement amounts (BRL)
//!
//! Metrics register against a per-instance registry so multiple stores can
//! coexist in one process (tests open several).

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total credits applied
    pub credits_total: IntCounter,

    /// Total debits applied
    pub debits_total: IntCounter,

    /// Debits rejected for insufficient funds
    pub debits_rejected_total: IntCounter,

    /// Wallets created
    pub wallets_created_total: IntCounter,

    /// Movement amount histogram (BRL; reporting only, never money math)
    pub movement_amount: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let credits_total =
            IntCounter::new("wallet_credits_total", "Total number of credit movements")?;
        registry.register(Box::new(credits_total.clone()))?;

        let debits_total =
            IntCounter::new("wallet_debits_total", "Total number of debit movements")?;
        registry.register(Box::new(debits_total.clone()))?;

        let debits_rejected_total = IntCounter::new(
            "wallet_debits_rejected_total",
            "Debits rejected for insufficient funds",
        )?;
        registry.register(Box::new(debits_rejected_total.clone()))?;

        let wallets_created_total = IntCounter::new(
            "wallet_wallets_created_total",
            "Wallets created lazily on first access",
        )?;
        registry.register(Box::new(wallets_created_total.clone()))?;

        let movement_amount = Histogram::with_opts(
            HistogramOpts::new("wallet_movement_amount", "Movement amounts in BRL").buckets(vec![
                1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0,
            ]),
        )?;
        registry.register(Box::new(movement_amount.clone()))?;

        Ok(Self {
            credits_total,
            debits_total,
            debits_rejected_total,
            wallets_created_total,
            movement_amount,
            registry,
        })
    }

    /// Record a credit movement
    pub fn record_credit(&self, amount: Decimal) {
        self.credits_total.inc();
        self.movement_amount.observe(amount.to_f64().unwrap_or(0.0));
    }

    /// Record a debit movement
    pub fn record_debit(&self, amount: Decimal) {
        self.debits_total.inc();
        self.movement_amount.observe(amount.to_f64().unwrap_or(0.0));
    }

    /// Record a rejected debit
    pub fn record_debit_rejected(&self) {
        self.debits_rejected_total.inc();
    }

    /// Record a wallet creation
    pub fn record_wallet_created(&self) {
        self.wallets_created_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
