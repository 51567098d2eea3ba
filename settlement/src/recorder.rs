//! Transaction recorder
//!
//! Records confirmed customer payments as immutable facts, one per order.
//! The payment confirmation webhook retries, so recording is idempotent: a
//! repeat call for the same order returns the already-recorded transaction.
//! A repeat call that disagrees on the amount is a different payment and is
//! rejected.

use crate::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use wallet_ledger::{
    Error as LedgerError, LedgerStore, OwnerId, PaymentMethod, Transaction, TransactionStatus,
};

/// Records one confirmed payment per order
pub struct TransactionRecorder {
    /// Ledger store
    ledger: Arc<LedgerStore>,

    /// Per-order locks (webhook retry race guard)
    order_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl TransactionRecorder {
    /// Create a recorder over the shared ledger store
    pub fn new(ledger: Arc<LedgerStore>) -> Self {
        Self {
            ledger,
            order_locks: DashMap::new(),
        }
    }

    /// Record a confirmed payment for an order
    ///
    /// Idempotent: calling again with the same order and amount returns the
    /// existing transaction. A conflicting amount fails with
    /// [`Error::DuplicateTransaction`].
    pub fn create_transaction(
        &self,
        order_id: Uuid,
        customer_id: OwnerId,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount).into());
        }

        let lock = self.order_lock(order_id);
        let _guard = lock.lock();

        if let Some(existing) = self.ledger.get_transaction(order_id)? {
            if existing.amount != amount {
                return Err(Error::DuplicateTransaction(format!(
                    "order {} already recorded with amount {}, got {}",
                    order_id, existing.amount, amount
                )));
            }

            tracing::debug!(order_id = %order_id, "Transaction already recorded");
            return Ok(existing);
        }

        let transaction = Transaction {
            order_id,
            customer_id,
            amount,
            method,
            status: TransactionStatus::Confirmed,
            created_at: Utc::now(),
        };

        self.ledger
            .with_unit(&[], |unit| unit.put_transaction(&transaction))?;

        tracing::info!(
            order_id = %order_id,
            amount = %amount,
            "Transaction recorded"
        );

        Ok(transaction)
    }

    /// Get the recorded payment for an order, if any
    pub fn transaction_for_order(&self, order_id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.ledger.get_transaction(order_id)?)
    }

    fn order_lock(&self, order_id: Uuid) -> Arc<Mutex<()>> {
        self.order_locks.entry(order_id).or_default().clone()
    }
}

impl std::fmt::Debug for TransactionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRecorder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_ledger::Config as LedgerConfig;

    fn test_recorder() -> (TransactionRecorder, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = LedgerConfig::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let ledger = Arc::new(LedgerStore::open(config).unwrap());
        (TransactionRecorder::new(ledger), temp_dir)
    }

    fn brl(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_create_transaction() {
        let (recorder, _temp) = test_recorder();
        let order_id = Uuid::new_v4();

        let transaction = recorder
            .create_transaction(order_id, OwnerId::new("cus-1"), brl(10000), PaymentMethod::Pix)
            .unwrap();

        assert_eq!(transaction.status, TransactionStatus::Confirmed);
        assert_eq!(transaction.amount, brl(10000));

        let stored = recorder.transaction_for_order(order_id).unwrap().unwrap();
        assert_eq!(stored.amount, brl(10000));
    }

    #[test]
    fn test_repeat_call_is_idempotent() {
        let (recorder, _temp) = test_recorder();
        let order_id = Uuid::new_v4();

        let first = recorder
            .create_transaction(order_id, OwnerId::new("cus-1"), brl(10000), PaymentMethod::Pix)
            .unwrap();
        let second = recorder
            .create_transaction(order_id, OwnerId::new("cus-1"), brl(10000), PaymentMethod::Pix)
            .unwrap();

        assert_eq!(first.created_at, second.created_at);
    }

    #[test]
    fn test_conflicting_amount_rejected() {
        let (recorder, _temp) = test_recorder();
        let order_id = Uuid::new_v4();

        recorder
            .create_transaction(order_id, OwnerId::new("cus-1"), brl(10000), PaymentMethod::Pix)
            .unwrap();

        let result = recorder.create_transaction(
            order_id,
            OwnerId::new("cus-1"),
            brl(9999),
            PaymentMethod::Pix,
        );
        assert!(matches!(result, Err(Error::DuplicateTransaction(_))));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let (recorder, _temp) = test_recorder();

        let result = recorder.create_transaction(
            Uuid::new_v4(),
            OwnerId::new("cus-1"),
            Decimal::ZERO,
            PaymentMethod::Card,
        );
        assert!(matches!(
            result,
            Err(Error::Ledger(LedgerError::InvalidAmount(_)))
        ));
    }
}
