//! Settlement orchestrator
//!
//! Turns a delivered order and its confirmed payment into wallet credits and
//! platform revenue, atomically.
//!
//! # Workflow
//!
//! 1. Preconditions: order delivered, payment confirmed and matching
//! 2. Idempotency: an existing payout for the order short-circuits
//! 3. Split: compute vendor/driver/platform/cashback shares
//! 4. One atomic unit: payout record, driver credit, vendor credit, platform
//!    revenue, customer cashback; everything commits or rolls back together
//!
//! The payout record is the idempotency anchor. Anchoring on payout existence
//! rather than order status makes re-invocation of the whole pipeline safe no
//! matter which step failed previously: either the payout committed (retry
//! returns it) or nothing did (retry starts clean). Retries are the caller's
//! responsibility; the engine never retries internally.

use crate::{
    config::Config,
    split::compute_split,
    types::{CompletedOrder, OrderStatus, SplitRates},
    Error, Result,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wallet_ledger::{
    Error as LedgerError, LedgerStore, MovementKind, OwnerType, Payout, PayoutStatus,
    PlatformRevenue, RevenueSource, Transaction, TransactionStatus, Wallet,
};

/// Settlement engine
pub struct SettlementEngine {
    /// Ledger store (shared, injected)
    ledger: Arc<LedgerStore>,

    /// Split rate table
    rates: SplitRates,

    /// Deadline for one atomic settlement unit
    deadline: Duration,

    /// Per-order locks: concurrent settlement attempts for the same order
    /// serialize on the exists-check-then-create section
    order_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SettlementEngine {
    /// Create an engine over a shared ledger store
    pub fn new(ledger: Arc<LedgerStore>, config: Config) -> Result<Self> {
        config.rates.validate()?;

        Ok(Self {
            ledger,
            rates: config.rates,
            deadline: Duration::from_millis(config.settlement_deadline_ms),
            order_locks: DashMap::new(),
        })
    }

    /// Open the ledger store named by the configuration and build an engine
    pub fn open(config: Config) -> Result<Self> {
        let ledger_config = wallet_ledger::Config {
            data_dir: config.ledger_data_dir.clone(),
            ..Default::default()
        };
        let ledger = Arc::new(LedgerStore::open(ledger_config)?);

        Self::new(ledger, config)
    }

    /// Shared ledger store
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }

    /// Settle a delivered order against its confirmed payment
    ///
    /// Idempotent: settling the same order again returns the existing payout
    /// and changes no balances. On failure nothing is visible and the order
    /// stays eligible for retry.
    pub async fn settle_order(
        &self,
        order: &CompletedOrder,
        transaction: &Transaction,
    ) -> Result<Payout> {
        self.check_preconditions(order, transaction)?;

        let ledger = Arc::clone(&self.ledger);
        let rates = self.rates.clone();
        let lock = self.order_lock(order.order_id);
        let order = order.clone();

        // The unit is a bounded sequence of store writes; run it off the
        // async executor under the configured deadline
        let task = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            settle_locked(&ledger, &rates, &order)
        });

        match tokio::time::timeout(self.deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(Error::SettlementFailed(format!(
                "settlement task failed: {}",
                join_err
            ))),
            // A commit landing after the deadline is harmless: the retry
            // finds the payout and short-circuits
            Err(_elapsed) => Err(Error::SettlementFailed(format!(
                "deadline of {:?} exceeded",
                self.deadline
            ))),
        }
    }

    /// Get the payout for an order, if settled
    pub fn payout_for_order(&self, order_id: Uuid) -> Result<Option<Payout>> {
        Ok(self.ledger.get_payout(order_id)?)
    }

    fn check_preconditions(&self, order: &CompletedOrder, transaction: &Transaction) -> Result<()> {
        if order.status != OrderStatus::Delivered {
            return Err(Error::InvalidOrder(format!(
                "order {} is not delivered ({:?})",
                order.order_id, order.status
            )));
        }

        if transaction.status != TransactionStatus::Confirmed {
            return Err(Error::InvalidOrder(format!(
                "payment for order {} is not confirmed ({:?})",
                order.order_id, transaction.status
            )));
        }

        if transaction.order_id != order.order_id {
            return Err(Error::InvalidOrder(format!(
                "transaction belongs to order {}, not {}",
                transaction.order_id, order.order_id
            )));
        }

        if transaction.amount != order.total_amount {
            return Err(Error::InvalidOrder(format!(
                "payment amount {} disagrees with order total {}",
                transaction.amount, order.total_amount
            )));
        }

        Ok(())
    }

    fn order_lock(&self, order_id: Uuid) -> Arc<Mutex<()>> {
        self.order_locks.entry(order_id).or_default().clone()
    }
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("rates", &self.rates)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// The settlement critical section, entered with the order lock held
fn settle_locked(
    ledger: &LedgerStore,
    rates: &SplitRates,
    order: &CompletedOrder,
) -> Result<Payout> {
    // Idempotency: the payout is the anchor
    if let Some(existing) = ledger.get_payout(order.order_id)? {
        tracing::debug!(
            order_id = %order.order_id,
            payout_id = %existing.payout_id,
            "Order already settled"
        );
        return Ok(existing);
    }

    tracing::info!(
        order_id = %order.order_id,
        total = %order.total_amount,
        "Settlement started"
    );

    let split = compute_split(order.total_amount, rates)?;

    // Wallets are created lazily on first credit; zero shares touch nothing
    let driver_wallet = resolve_wallet(ledger, OwnerType::Driver, order, split.driver_amount)?;
    let vendor_wallet = resolve_wallet(ledger, OwnerType::Vendor, order, split.vendor_amount)?;
    let customer_wallet =
        resolve_wallet(ledger, OwnerType::Customer, order, split.cashback_amount)?;

    let now = Utc::now();
    let payout = Payout {
        payout_id: Uuid::now_v7(),
        order_id: order.order_id,
        driver_id: order.driver_id.clone(),
        vendor_id: order.vendor_id.clone(),
        driver_amount: split.driver_amount,
        vendor_amount: split.vendor_amount,
        platform_amount: split.platform_amount,
        status: PayoutStatus::Paid,
        paid_at: Some(now),
    };

    let unit_wallets: Vec<Uuid> = [&driver_wallet, &vendor_wallet, &customer_wallet]
        .into_iter()
        .flatten()
        .map(|w| w.wallet_id)
        .collect();

    let result = ledger.with_unit(&unit_wallets, |unit| {
        unit.put_payout(&payout)?;

        if let Some(wallet) = &driver_wallet {
            unit.credit(
                wallet.wallet_id,
                split.driver_amount,
                MovementKind::Payout,
                format!("Delivery payout for order {}", order.order_id),
            )?;
        }

        if let Some(wallet) = &vendor_wallet {
            unit.credit(
                wallet.wallet_id,
                split.vendor_amount,
                MovementKind::Payout,
                format!("Sale payout for order {}", order.order_id),
            )?;
        }

        if split.platform_amount != Decimal::ZERO {
            unit.put_platform_revenue(&PlatformRevenue {
                revenue_id: Uuid::now_v7(),
                order_id: order.order_id,
                source: RevenueSource::OrderCommission,
                amount: split.platform_amount,
                created_at: now,
            })?;
        }

        // Cashback is platform-funded, independent of the split above
        if let Some(wallet) = &customer_wallet {
            unit.credit(
                wallet.wallet_id,
                split.cashback_amount,
                MovementKind::Cashback,
                format!("Cashback for order {}", order.order_id),
            )?;
        }

        Ok(())
    });

    match result {
        Ok(()) => {
            tracing::info!(
                order_id = %order.order_id,
                payout_id = %payout.payout_id,
                vendor = %split.vendor_amount,
                driver = %split.driver_amount,
                platform = %split.platform_amount,
                cashback = %split.cashback_amount,
                "Order settled"
            );
            Ok(payout)
        }
        // Duplicate insert lost a race; re-read the winner
        Err(LedgerError::PayoutExists(_)) => ledger.get_payout(order.order_id)?.ok_or_else(|| {
            Error::SettlementFailed(format!(
                "payout for order {} vanished after duplicate insert",
                order.order_id
            ))
        }),
        Err(err @ (LedgerError::Storage(_) | LedgerError::Io(_) | LedgerError::Serialization(_))) => {
            Err(Error::SettlementFailed(err.to_string()))
        }
        Err(err) => Err(Error::Ledger(err)),
    }
}

fn resolve_wallet(
    ledger: &LedgerStore,
    owner_type: OwnerType,
    order: &CompletedOrder,
    amount: Decimal,
) -> Result<Option<Wallet>> {
    if amount <= Decimal::ZERO {
        return Ok(None);
    }

    let owner_id = match owner_type {
        OwnerType::Driver => &order.driver_id,
        OwnerType::Vendor => &order.vendor_id,
        OwnerType::Customer => &order.customer_id,
    };

    Ok(Some(ledger.get_or_create_wallet(owner_type, owner_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_ledger::{Config as LedgerConfig, OwnerId, PaymentMethod};

    fn test_engine() -> (SettlementEngine, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger_config = LedgerConfig::default();
        ledger_config.data_dir = temp_dir.path().to_path_buf();
        let ledger = Arc::new(LedgerStore::open(ledger_config).unwrap());

        let engine = SettlementEngine::new(ledger, Config::default()).unwrap();
        (engine, temp_dir)
    }

    fn brl(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn delivered_order(total_cents: i64) -> CompletedOrder {
        CompletedOrder {
            order_id: Uuid::new_v4(),
            customer_id: OwnerId::new("cus-1"),
            vendor_id: OwnerId::new("mkt-1"),
            driver_id: OwnerId::new("drv-1"),
            total_amount: brl(total_cents),
            status: OrderStatus::Delivered,
        }
    }

    fn confirmed_payment(order: &CompletedOrder) -> Transaction {
        Transaction {
            order_id: order.order_id,
            customer_id: order.customer_id.clone(),
            amount: order.total_amount,
            method: PaymentMethod::Pix,
            status: TransactionStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_settle_order_credits_all_parties() {
        let (engine, _temp) = test_engine();
        let order = delivered_order(10000);
        let transaction = confirmed_payment(&order);

        let payout = engine.settle_order(&order, &transaction).await.unwrap();

        assert_eq!(payout.vendor_amount, brl(8000));
        assert_eq!(payout.driver_amount, brl(1000));
        assert_eq!(payout.platform_amount, brl(1000));
        assert_eq!(payout.status, PayoutStatus::Paid);
        assert!(payout.paid_at.is_some());

        let ledger = engine.ledger();
        let driver = ledger
            .get_extract(OwnerType::Driver, &order.driver_id)
            .unwrap();
        assert_eq!(driver.balance, brl(1000));
        assert_eq!(driver.movements.len(), 1);
        assert_eq!(driver.movements[0].kind, MovementKind::Payout);

        let vendor = ledger
            .get_extract(OwnerType::Vendor, &order.vendor_id)
            .unwrap();
        assert_eq!(vendor.balance, brl(8000));

        let customer = ledger
            .get_extract(OwnerType::Customer, &order.customer_id)
            .unwrap();
        assert_eq!(customer.balance, brl(500));
        assert_eq!(customer.movements[0].kind, MovementKind::Cashback);

        let revenue = ledger.revenue_for_order(order.order_id).unwrap();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].amount, brl(1000));
        assert_eq!(revenue[0].source, RevenueSource::OrderCommission);
    }

    #[tokio::test]
    async fn test_settle_order_is_idempotent() {
        let (engine, _temp) = test_engine();
        let order = delivered_order(10000);
        let transaction = confirmed_payment(&order);

        let first = engine.settle_order(&order, &transaction).await.unwrap();
        let second = engine.settle_order(&order, &transaction).await.unwrap();

        assert_eq!(first.payout_id, second.payout_id);

        let ledger = engine.ledger();
        let driver = ledger
            .get_extract(OwnerType::Driver, &order.driver_id)
            .unwrap();
        assert_eq!(driver.balance, brl(1000));
        assert_eq!(driver.movements.len(), 1);

        assert_eq!(ledger.revenue_for_order(order.order_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undelivered_order_rejected() {
        let (engine, _temp) = test_engine();
        let mut order = delivered_order(10000);
        order.status = OrderStatus::InTransit;
        let transaction = confirmed_payment(&order);

        let result = engine.settle_order(&order, &transaction).await;
        assert!(matches!(result, Err(Error::InvalidOrder(_))));
        assert!(engine.payout_for_order(order.order_id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconfirmed_payment_rejected() {
        let (engine, _temp) = test_engine();
        let order = delivered_order(10000);
        let mut transaction = confirmed_payment(&order);
        transaction.status = TransactionStatus::Pending;

        let result = engine.settle_order(&order, &transaction).await;
        assert!(matches!(result, Err(Error::InvalidOrder(_))));
    }

    #[tokio::test]
    async fn test_mismatched_transaction_rejected() {
        let (engine, _temp) = test_engine();
        let order = delivered_order(10000);

        let mut wrong_order = confirmed_payment(&order);
        wrong_order.order_id = Uuid::new_v4();
        assert!(matches!(
            engine.settle_order(&order, &wrong_order).await,
            Err(Error::InvalidOrder(_))
        ));

        let mut wrong_amount = confirmed_payment(&order);
        wrong_amount.amount = brl(9999);
        assert!(matches!(
            engine.settle_order(&order, &wrong_amount).await,
            Err(Error::InvalidOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_cashback_creates_no_customer_wallet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger_config = LedgerConfig::default();
        ledger_config.data_dir = temp_dir.path().to_path_buf();
        let ledger = Arc::new(LedgerStore::open(ledger_config).unwrap());

        let mut config = Config::default();
        config.rates.cashback_rate = Decimal::ZERO;
        let engine = SettlementEngine::new(ledger, config).unwrap();

        let order = delivered_order(10000);
        let transaction = confirmed_payment(&order);
        engine.settle_order(&order, &transaction).await.unwrap();

        let customer = engine
            .ledger()
            .wallet_for_owner(OwnerType::Customer, &order.customer_id)
            .unwrap();
        assert!(customer.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_settlement_of_same_order() {
        let (engine, _temp) = test_engine();
        let engine = Arc::new(engine);
        let order = delivered_order(10000);
        let transaction = confirmed_payment(&order);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = engine.clone();
            let order = order.clone();
            let transaction = transaction.clone();
            handles.push(tokio::spawn(async move {
                engine.settle_order(&order, &transaction).await.unwrap()
            }));
        }

        let mut payout_ids = Vec::new();
        for handle in handles {
            payout_ids.push(handle.await.unwrap().payout_id);
        }
        assert!(payout_ids.windows(2).all(|w| w[0] == w[1]));

        let driver = engine
            .ledger()
            .get_extract(OwnerType::Driver, &order.driver_id)
            .unwrap();
        assert_eq!(driver.balance, brl(1000));
        assert_eq!(driver.movements.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_settlements_for_same_driver() {
        let (engine, _temp) = test_engine();
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let order = delivered_order(10000);
                let transaction = confirmed_payment(&order);
                engine.settle_order(&order, &transaction).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let ledger = engine.ledger();
        let driver = ledger
            .get_extract(OwnerType::Driver, &OwnerId::new("drv-1"))
            .unwrap();
        assert_eq!(driver.balance, brl(6000));
        assert_eq!(driver.movements.len(), 6);

        let wallet = ledger
            .wallet_for_owner(OwnerType::Driver, &OwnerId::new("drv-1"))
            .unwrap()
            .unwrap();
        assert!(ledger.check_reconciliation(wallet.wallet_id).unwrap());
    }
}
