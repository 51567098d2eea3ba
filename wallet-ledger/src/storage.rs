//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `wallets` - Wallet records (key: wallet_id)
//! - `movements` - Append-only movement log (key: movement_id)
//! - `transactions` - Confirmed payments (key: order_id)
//! - `payouts` - Settlement records (key: order_id)
//! - `platform_revenue` - Commission records (key: order_id || revenue_id)
//! - `indices` - Secondary indices for fast lookups
//!
//! Multi-entity mutations are staged into a single `WriteBatch` and committed
//! atomically; the batch is the unit-of-work boundary for the whole crate.

use crate::{
    error::{Error, Result},
    types::{Movement, OwnerId, OwnerType, Payout, PlatformRevenue, Transaction, Wallet},
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_WALLETS: &str = "wallets";
const CF_MOVEMENTS: &str = "movements";
const CF_TRANSACTIONS: &str = "transactions";
const CF_PAYOUTS: &str = "payouts";
const CF_REVENUE: &str = "platform_revenue";
const CF_INDICES: &str = "indices";

/// Index key tags (first byte) so index kinds cannot collide
const IDX_OWNER_WALLET: u8 = b'o';
const IDX_WALLET_MOVEMENT: u8 = b'm';

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );

        // Universal compaction for write-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        // Enable statistics
        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        // Column family descriptors
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WALLETS, Self::cf_options_wallets()),
            ColumnFamilyDescriptor::new(CF_MOVEMENTS, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_PAYOUTS, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_REVENUE, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        // Open database
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_wallets() -> Options {
        let mut opts = Options::default();
        // Wallets are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_append_only() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Wallet operations

    /// Get wallet by ID
    pub fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        let cf = self.cf_handle(CF_WALLETS)?;

        let value = self
            .db
            .get_cf(cf, wallet_id.as_bytes())?
            .ok_or_else(|| Error::WalletNotFound(wallet_id.to_string()))?;

        let wallet: Wallet = bincode::deserialize(&value)?;
        Ok(wallet)
    }

    /// Look up a wallet ID by owner (via index)
    pub fn wallet_id_for_owner(
        &self,
        owner_type: OwnerType,
        owner_id: &OwnerId,
    ) -> Result<Option<Uuid>> {
        let cf = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key_owner_wallet(owner_type, owner_id);

        match self.db.get_cf(cf, &key)? {
            Some(value) => {
                let bytes: [u8; 16] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("Corrupt owner index entry".to_string()))?;
                Ok(Some(Uuid::from_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    // Movement operations

    /// Get movement by ID
    pub fn get_movement(&self, movement_id: Uuid) -> Result<Movement> {
        let cf = self.cf_handle(CF_MOVEMENTS)?;

        let value = self
            .db
            .get_cf(cf, movement_id.as_bytes())?
            .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;

        let movement: Movement = bincode::deserialize(&value)?;
        Ok(movement)
    }

    /// Get a wallet's movements ordered by sequence (via index)
    ///
    /// `reverse` returns most-recent-first, the extract presentation order.
    pub fn movements_for_wallet(&self, wallet_id: Uuid, reverse: bool) -> Result<Vec<Movement>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let prefix = Self::index_prefix_wallet_movement(wallet_id);

        // Reverse scans start just past the largest sequence for this wallet
        let start_key_rev = Self::index_key_wallet_movement(wallet_id, u64::MAX);
        let mode = if reverse {
            IteratorMode::From(start_key_rev.as_slice(), rocksdb::Direction::Reverse)
        } else {
            IteratorMode::From(prefix.as_slice(), rocksdb::Direction::Forward)
        };

        let mut movements = Vec::new();
        for item in self.db.iterator_cf(cf_indices, mode) {
            let (key, value) = item?;

            if !key.starts_with(&prefix) {
                break;
            }

            let bytes: [u8; 16] = value
                .as_ref()
                .try_into()
                .map_err(|_| Error::Storage("Corrupt movement index entry".to_string()))?;
            movements.push(self.get_movement(Uuid::from_bytes(bytes))?);
        }

        Ok(movements)
    }

    // Transaction / payout / revenue reads

    /// Get the confirmed payment for an order, if recorded
    pub fn get_transaction(&self, order_id: Uuid) -> Result<Option<Transaction>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;

        match self.db.get_cf(cf, order_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Get the payout for an order, if settled
    pub fn get_payout(&self, order_id: Uuid) -> Result<Option<Payout>> {
        let cf = self.cf_handle(CF_PAYOUTS)?;

        match self.db.get_cf(cf, order_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Get all commission records for an order
    pub fn revenue_for_order(&self, order_id: Uuid) -> Result<Vec<PlatformRevenue>> {
        let cf = self.cf_handle(CF_REVENUE)?;

        let prefix = order_id.as_bytes().to_vec();
        let mode = IteratorMode::From(prefix.as_slice(), rocksdb::Direction::Forward);

        let mut entries = Vec::new();
        for item in self.db.iterator_cf(cf, mode) {
            let (key, value) = item?;

            if !key.starts_with(&prefix) {
                break;
            }

            entries.push(bincode::deserialize(&value)?);
        }

        Ok(entries)
    }

    // Batch staging (atomic commit via `write`)

    /// Stage a wallet record update
    pub fn stage_wallet(&self, batch: &mut WriteBatch, wallet: &Wallet) -> Result<()> {
        let cf = self.cf_handle(CF_WALLETS)?;
        batch.put_cf(cf, wallet.wallet_id.as_bytes(), bincode::serialize(wallet)?);
        Ok(())
    }

    /// Stage a newly created wallet together with its owner index entry
    pub fn stage_new_wallet(&self, batch: &mut WriteBatch, wallet: &Wallet) -> Result<()> {
        self.stage_wallet(batch, wallet)?;

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key_owner_wallet(wallet.owner_type, &wallet.owner_id);
        batch.put_cf(cf_indices, &key, wallet.wallet_id.as_bytes());
        Ok(())
    }

    /// Stage an appended movement together with its sequence index entry
    pub fn stage_movement(&self, batch: &mut WriteBatch, movement: &Movement) -> Result<()> {
        let cf = self.cf_handle(CF_MOVEMENTS)?;
        batch.put_cf(
            cf,
            movement.movement_id.as_bytes(),
            bincode::serialize(movement)?,
        );

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key_wallet_movement(movement.wallet_id, movement.sequence);
        batch.put_cf(cf_indices, &key, movement.movement_id.as_bytes());
        Ok(())
    }

    /// Stage a transaction record
    pub fn stage_transaction(&self, batch: &mut WriteBatch, transaction: &Transaction) -> Result<()> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        batch.put_cf(
            cf,
            transaction.order_id.as_bytes(),
            bincode::serialize(transaction)?,
        );
        Ok(())
    }

    /// Stage a payout record
    pub fn stage_payout(&self, batch: &mut WriteBatch, payout: &Payout) -> Result<()> {
        let cf = self.cf_handle(CF_PAYOUTS)?;
        batch.put_cf(cf, payout.order_id.as_bytes(), bincode::serialize(payout)?);
        Ok(())
    }

    /// Stage a platform revenue record
    pub fn stage_revenue(&self, batch: &mut WriteBatch, revenue: &PlatformRevenue) -> Result<()> {
        let cf = self.cf_handle(CF_REVENUE)?;

        let mut key = revenue.order_id.as_bytes().to_vec();
        key.extend_from_slice(revenue.revenue_id.as_bytes());
        batch.put_cf(cf, &key, bincode::serialize(revenue)?);
        Ok(())
    }

    /// Commit a staged batch atomically
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch)?;
        Ok(())
    }

    // Index key helpers

    fn index_key_owner_wallet(owner_type: OwnerType, owner_id: &OwnerId) -> Vec<u8> {
        let mut key = vec![IDX_OWNER_WALLET, owner_type as u8];
        key.extend_from_slice(owner_id.as_str().as_bytes());
        key
    }

    fn index_prefix_wallet_movement(wallet_id: Uuid) -> Vec<u8> {
        let mut key = vec![IDX_WALLET_MOVEMENT];
        key.extend_from_slice(wallet_id.as_bytes());
        key
    }

    fn index_key_wallet_movement(wallet_id: Uuid, sequence: u64) -> Vec<u8> {
        let mut key = Self::index_prefix_wallet_movement(wallet_id);
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }

    // Statistics

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats> {
        let cf_wallets = self.cf_handle(CF_WALLETS)?;
        let cf_movements = self.cf_handle(CF_MOVEMENTS)?;
        let cf_payouts = self.cf_handle(CF_PAYOUTS)?;

        Ok(StorageStats {
            total_wallets: self.approximate_count(cf_wallets)?,
            total_movements: self.approximate_count(cf_movements)?,
            total_payouts: self.approximate_count(cf_payouts)?,
        })
    }

    fn approximate_count(&self, cf: &ColumnFamily) -> Result<u64> {
        // RocksDB property for approximate count
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate wallet count
    pub total_wallets: u64,
    /// Approximate movement count
    pub total_movements: u64,
    /// Approximate payout count
    pub total_payouts: u64,
}
