//! Main ledger orchestration layer
//!
//! This module ties storage, locking, and metrics into a high-level API for
//! wallet credits, debits, and extracts.
//!
//! # Invariants
//!
//! - A wallet's cached balance always equals the signed sum of its movements;
//!   both commit in the same atomic batch.
//! - Balances never go negative; a debit that would overdraw fails and leaves
//!   the wallet untouched.
//! - Per-wallet locks serialize mutations, so `balance += amount` is never
//!   lost to a race.
//!
//! # Unit of work
//!
//! Multi-wallet operations (settlement credits a driver, a vendor, and a
//! customer in one shot) go through [`LedgerStore::with_unit`]: wallet locks
//! are acquired in sorted order, all writes are staged into one RocksDB
//! `WriteBatch`, and the batch commits only if the closure returns `Ok`.
//! Every other exit path discards the staged writes.
//!
//! # Example
//!
//! ```no_run
//! use wallet_ledger::{Config, LedgerStore, MovementKind, OwnerId, OwnerType};
//! use rust_decimal::Decimal;
//!
//! fn main() -> wallet_ledger::Result<()> {
//!     let ledger = LedgerStore::open(Config::default())?;
//!
//!     let wallet = ledger.get_or_create_wallet(OwnerType::Driver, &OwnerId::new("drv-1"))?;
//!     ledger.credit(
//!         wallet.wallet_id,
//!         Decimal::new(1000, 2),
//!         MovementKind::Deposit,
//!         "signup bonus",
//!     )?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    metrics::Metrics,
    types::{
        Direction, Movement, MovementKind, OwnerId, OwnerType, Payout, PlatformRevenue,
        Transaction, Wallet, WalletExtract,
    },
    Config, Error, Result, Storage,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Main ledger store interface
///
/// Opened once at process start and passed by reference to callers; owns the
/// database handle and the lock tables.
pub struct LedgerStore {
    /// Storage backend
    storage: Arc<Storage>,

    /// Per-owner creation locks (lazy wallet creation race guard)
    owner_locks: DashMap<(OwnerType, OwnerId), Arc<Mutex<()>>>,

    /// Per-wallet mutation locks
    wallet_locks: DashMap<Uuid, Arc<Mutex<()>>>,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl LedgerStore {
    /// Open ledger store with configuration
    pub fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let metrics = Metrics::new()?;

        Ok(Self {
            storage,
            owner_locks: DashMap::new(),
            wallet_locks: DashMap::new(),
            metrics,
            config,
        })
    }

    /// Metrics collector for this store
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration this store was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return the owner's wallet, creating it with balance 0 on first access
    ///
    /// Safe under concurrent first access: the owner index is re-checked under
    /// a per-owner lock, so one wallet exists per (owner type, owner id).
    pub fn get_or_create_wallet(
        &self,
        owner_type: OwnerType,
        owner_id: &OwnerId,
    ) -> Result<Wallet> {
        if let Some(wallet_id) = self.storage.wallet_id_for_owner(owner_type, owner_id)? {
            return self.storage.get_wallet(wallet_id);
        }

        let lock = self.owner_lock(owner_type, owner_id);
        let _guard = lock.lock();

        // Re-check under the lock: a racing caller may have created it
        if let Some(wallet_id) = self.storage.wallet_id_for_owner(owner_type, owner_id)? {
            return self.storage.get_wallet(wallet_id);
        }

        let wallet = Wallet::new(owner_type, owner_id.clone());
        let mut batch = WriteBatch::default();
        self.storage.stage_new_wallet(&mut batch, &wallet)?;
        self.storage.write(batch)?;

        self.metrics.record_wallet_created();
        tracing::info!(
            wallet_id = %wallet.wallet_id,
            owner_type = %owner_type,
            owner_id = %owner_id,
            "Wallet created"
        );

        Ok(wallet)
    }

    /// Get the owner's wallet without creating it
    pub fn wallet_for_owner(
        &self,
        owner_type: OwnerType,
        owner_id: &OwnerId,
    ) -> Result<Option<Wallet>> {
        match self.storage.wallet_id_for_owner(owner_type, owner_id)? {
            Some(wallet_id) => Ok(Some(self.storage.get_wallet(wallet_id)?)),
            None => Ok(None),
        }
    }

    /// Get wallet by ID
    pub fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        self.storage.get_wallet(wallet_id)
    }

    /// Credit a wallet, appending a movement
    pub fn credit(
        &self,
        wallet_id: Uuid,
        amount: Decimal,
        kind: MovementKind,
        description: impl Into<String>,
    ) -> Result<Movement> {
        let description = description.into();
        self.with_unit(&[wallet_id], |unit| {
            unit.credit(wallet_id, amount, kind, description)
        })
    }

    /// Debit a wallet, appending a movement
    ///
    /// Fails with [`Error::InsufficientFunds`] if the amount exceeds the
    /// balance; the wallet is left untouched.
    pub fn debit(
        &self,
        wallet_id: Uuid,
        amount: Decimal,
        kind: MovementKind,
        description: impl Into<String>,
    ) -> Result<Movement> {
        let description = description.into();
        self.with_unit(&[wallet_id], |unit| {
            unit.debit(wallet_id, amount, kind, description)
        })
    }

    /// Current balance plus movement history, most recent first
    ///
    /// An owner with no wallet yet gets a zero extract; absence of activity is
    /// a valid state, never an error.
    pub fn get_extract(&self, owner_type: OwnerType, owner_id: &OwnerId) -> Result<WalletExtract> {
        let wallet_id = match self.storage.wallet_id_for_owner(owner_type, owner_id)? {
            Some(id) => id,
            None => return Ok(WalletExtract::empty()),
        };

        let wallet = self.storage.get_wallet(wallet_id)?;
        let movements = self.storage.movements_for_wallet(wallet_id, true)?;

        Ok(WalletExtract {
            balance: wallet.balance,
            movements,
        })
    }

    /// Recompute a wallet's balance from its movement history
    pub fn recompute_balance(&self, wallet_id: Uuid) -> Result<Decimal> {
        let movements = self.storage.movements_for_wallet(wallet_id, false)?;
        Ok(movements.iter().map(Movement::signed_amount).sum())
    }

    /// Check the reconciliation invariant for a wallet
    ///
    /// The cached balance must equal the signed sum of all movements.
    pub fn check_reconciliation(&self, wallet_id: Uuid) -> Result<bool> {
        let wallet = self.storage.get_wallet(wallet_id)?;
        let replayed = self.recompute_balance(wallet_id)?;

        if wallet.balance != replayed {
            tracing::warn!(
                wallet_id = %wallet_id,
                cached = %wallet.balance,
                replayed = %replayed,
                "Reconciliation mismatch"
            );
        }

        Ok(wallet.balance == replayed)
    }

    /// Run a unit of work over the named wallets
    ///
    /// Acquires the wallets' locks in sorted order (no lock-order inversions),
    /// loads their current states, and hands a [`LedgerUnit`] to the closure
    /// for staging. All staged writes commit as one atomic batch if the
    /// closure returns `Ok`; any error discards them.
    pub fn with_unit<T>(
        &self,
        wallet_ids: &[Uuid],
        f: impl FnOnce(&mut LedgerUnit<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut ids: Vec<Uuid> = wallet_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let locks: Vec<Arc<Mutex<()>>> = ids.iter().map(|id| self.wallet_lock(*id)).collect();
        let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();

        // Wallet states are loaded under the locks, so they are current
        let mut wallets = HashMap::with_capacity(ids.len());
        for id in &ids {
            wallets.insert(*id, self.storage.get_wallet(*id)?);
        }

        let mut unit = LedgerUnit {
            store: self,
            batch: WriteBatch::default(),
            wallets,
            staged: Vec::new(),
        };

        let out = f(&mut unit)?;

        let LedgerUnit { batch, staged, .. } = unit;
        self.storage.write(batch)?;

        for (direction, amount) in staged {
            match direction {
                Direction::In => self.metrics.record_credit(amount),
                Direction::Out => self.metrics.record_debit(amount),
            }
        }

        Ok(out)
    }

    /// Get the confirmed payment for an order, if recorded
    pub fn get_transaction(&self, order_id: Uuid) -> Result<Option<Transaction>> {
        self.storage.get_transaction(order_id)
    }

    /// Get the payout for an order, if settled
    pub fn get_payout(&self, order_id: Uuid) -> Result<Option<Payout>> {
        self.storage.get_payout(order_id)
    }

    /// Get all commission records for an order
    pub fn revenue_for_order(&self, order_id: Uuid) -> Result<Vec<PlatformRevenue>> {
        self.storage.revenue_for_order(order_id)
    }

    /// Storage statistics
    pub fn stats(&self) -> Result<crate::storage::StorageStats> {
        self.storage.get_stats()
    }

    /// Close the store (graceful shutdown)
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.storage) {
            Ok(storage) => storage.close(),
            Err(_) => Ok(()),
        }
    }

    fn owner_lock(&self, owner_type: OwnerType, owner_id: &OwnerId) -> Arc<Mutex<()>> {
        self.owner_locks
            .entry((owner_type, owner_id.clone()))
            .or_default()
            .clone()
    }

    fn wallet_lock(&self, wallet_id: Uuid) -> Arc<Mutex<()>> {
        self.wallet_locks.entry(wallet_id).or_default().clone()
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("data_dir", &self.config.data_dir)
            .finish_non_exhaustive()
    }
}

/// Staged unit of work over a set of locked wallets
///
/// Created by [`LedgerStore::with_unit`]. Credits and debits mutate in-memory
/// wallet states and stage the corresponding writes; nothing is visible until
/// the whole unit commits.
pub struct LedgerUnit<'a> {
    store: &'a LedgerStore,
    batch: WriteBatch,
    wallets: HashMap<Uuid, Wallet>,
    staged: Vec<(Direction, Decimal)>,
}

impl LedgerUnit<'_> {
    /// Stage a credit against one of the unit's wallets
    pub fn credit(
        &mut self,
        wallet_id: Uuid,
        amount: Decimal,
        kind: MovementKind,
        description: impl Into<String>,
    ) -> Result<Movement> {
        self.apply(wallet_id, amount, kind, Direction::In, description.into())
    }

    /// Stage a debit against one of the unit's wallets
    pub fn debit(
        &mut self,
        wallet_id: Uuid,
        amount: Decimal,
        kind: MovementKind,
        description: impl Into<String>,
    ) -> Result<Movement> {
        self.apply(wallet_id, amount, kind, Direction::Out, description.into())
    }

    /// Stage a payout record; fails if one already exists for the order
    pub fn put_payout(&mut self, payout: &Payout) -> Result<()> {
        if self.store.storage.get_payout(payout.order_id)?.is_some() {
            return Err(Error::PayoutExists(payout.order_id));
        }
        self.store.storage.stage_payout(&mut self.batch, payout)
    }

    /// Stage a transaction record; fails if one already exists for the order
    pub fn put_transaction(&mut self, transaction: &Transaction) -> Result<()> {
        if self
            .store
            .storage
            .get_transaction(transaction.order_id)?
            .is_some()
        {
            return Err(Error::TransactionExists(transaction.order_id));
        }
        self.store
            .storage
            .stage_transaction(&mut self.batch, transaction)
    }

    /// Stage a platform revenue record
    pub fn put_platform_revenue(&mut self, revenue: &PlatformRevenue) -> Result<()> {
        self.store.storage.stage_revenue(&mut self.batch, revenue)
    }

    /// Current in-unit state of a wallet
    pub fn wallet(&self, wallet_id: Uuid) -> Option<&Wallet> {
        self.wallets.get(&wallet_id)
    }

    fn apply(
        &mut self,
        wallet_id: Uuid,
        amount: Decimal,
        kind: MovementKind,
        direction: Direction,
        description: String,
    ) -> Result<Movement> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        let wallet = self
            .wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| Error::WalletNotFound(wallet_id.to_string()))?;

        if direction == Direction::Out && amount > wallet.balance {
            self.store.metrics.record_debit_rejected();
            return Err(Error::InsufficientFunds {
                requested: amount,
                available: wallet.balance,
            });
        }

        let now = Utc::now();
        let sequence = wallet.movement_seq + 1;

        let movement = Movement {
            movement_id: Uuid::now_v7(),
            wallet_id,
            kind,
            amount,
            direction,
            description,
            sequence,
            created_at: now,
        };

        match direction {
            Direction::In => {
                wallet.balance += amount;
                wallet.total_in += amount;
            }
            Direction::Out => {
                wallet.balance -= amount;
                wallet.total_out += amount;
            }
        }
        wallet.movement_seq = sequence;
        wallet.updated_at = now;

        self.store.storage.stage_movement(&mut self.batch, &movement)?;
        self.store.storage.stage_wallet(&mut self.batch, wallet)?;
        self.staged.push((direction, amount));

        tracing::debug!(
            wallet_id = %wallet_id,
            kind = %kind,
            amount = %amount,
            sequence,
            "Movement staged"
        );

        Ok(movement)
    }
}

impl std::fmt::Debug for LedgerUnit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerUnit")
            .field("wallets", &self.wallets.keys())
            .field("staged", &self.staged.len())
            .finish_non_exhaustive()
    }
}
