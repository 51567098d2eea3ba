//! Core types for the wallet ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wallet owner role
///
/// Resolved once at the boundary from the collaborator subsystem's user
/// record; never re-derived from role strings downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OwnerType {
    /// Delivery driver
    Driver = 1,
    /// Vendor / market
    Vendor = 2,
    /// Customer (cashback wallet)
    Customer = 3,
}

impl OwnerType {
    /// Stable tag used in index keys and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::Driver => "driver",
            OwnerType::Vendor => "vendor",
            OwnerType::Customer => "customer",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "driver" => Some(OwnerType::Driver),
            "vendor" => Some(OwnerType::Vendor),
            "customer" => Some(OwnerType::Customer),
            _ => None,
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owner identifier (user id issued by the account subsystem)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create new owner ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-owner wallet
///
/// The balance field is a cache over the movement history; every mutation
/// goes through credit/debit so the cache and the history commit together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet ID
    pub wallet_id: Uuid,

    /// Owner role
    pub owner_type: OwnerType,

    /// Owner identifier
    pub owner_id: OwnerId,

    /// Current balance (never negative)
    pub balance: Decimal,

    /// Lifetime total credited
    pub total_in: Decimal,

    /// Lifetime total debited
    pub total_out: Decimal,

    /// Monotonic per-wallet movement sequence (last assigned)
    pub movement_seq: u64,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create an empty wallet for an owner
    pub fn new(owner_type: OwnerType, owner_id: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            wallet_id: Uuid::new_v4(),
            owner_type,
            owner_id,
            balance: Decimal::ZERO,
            total_in: Decimal::ZERO,
            total_out: Decimal::ZERO,
            movement_seq: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Credit (balance increases)
    In = 1,
    /// Debit (balance decreases)
    Out = 2,
}

/// Movement kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MovementKind {
    /// Customer cashback credit
    Cashback = 1,
    /// Settlement payout share
    Payout = 2,
    /// Withdrawal to external account
    Withdrawal = 3,
    /// Deposit from external account
    Deposit = 4,
    /// Purchase paid from wallet balance
    Purchase = 5,
}

impl MovementKind {
    /// Stable tag used in extracts and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Cashback => "cashback",
            MovementKind::Payout => "payout",
            MovementKind::Withdrawal => "withdrawal",
            MovementKind::Deposit => "deposit",
            MovementKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable ledger entry against a wallet
///
/// Movements are append-only: never mutated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unique movement ID (UUIDv7 for time-ordering)
    pub movement_id: Uuid,

    /// Owning wallet
    pub wallet_id: Uuid,

    /// Movement kind
    pub kind: MovementKind,

    /// Amount (always positive; direction carries the sign)
    pub amount: Decimal,

    /// Credit or debit
    pub direction: Direction,

    /// Human-readable description
    pub description: String,

    /// Monotonic per-wallet sequence number
    pub sequence: u64,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Signed amount: positive for credits, negative for debits
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::In => self.amount,
            Direction::Out => -self.amount,
        }
    }
}

/// Payment method reported by the payment collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PaymentMethod {
    /// Pix instant transfer
    Pix = 1,
    /// Credit/debit card
    Card = 2,
    /// Cash on delivery
    Cash = 3,
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Awaiting payment confirmation
    Pending = 1,
    /// Payment confirmed
    Confirmed = 2,
    /// Payment failed
    Failed = 3,
}

/// Confirmed customer payment tied to exactly one order
///
/// Keyed by order id; immutable once confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Order this payment belongs to
    pub order_id: Uuid,

    /// Paying customer
    pub customer_id: OwnerId,

    /// Payment amount
    pub amount: Decimal,

    /// Payment method
    pub method: PaymentMethod,

    /// Status
    pub status: TransactionStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Payout status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PayoutStatus {
    /// Created but not yet paid out
    Pending = 1,
    /// Paid out to wallets
    Paid = 2,
}

/// Settlement record for a completed order
///
/// Keyed by order id. Its existence is the idempotency anchor: a second
/// settlement attempt for the same order finds it and short-circuits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    /// Unique payout ID (UUIDv7)
    pub payout_id: Uuid,

    /// Settled order
    pub order_id: Uuid,

    /// Driver credited
    pub driver_id: OwnerId,

    /// Vendor credited
    pub vendor_id: OwnerId,

    /// Driver share
    pub driver_amount: Decimal,

    /// Vendor share
    pub vendor_amount: Decimal,

    /// Platform share
    pub platform_amount: Decimal,

    /// Status
    pub status: PayoutStatus,

    /// Paid timestamp
    pub paid_at: Option<DateTime<Utc>>,
}

/// Revenue source tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RevenueSource {
    /// Commission on a settled order
    OrderCommission = 1,
}

impl RevenueSource {
    /// Stable tag used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueSource::OrderCommission => "order_commission",
        }
    }
}

/// Append-only platform commission record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRevenue {
    /// Unique revenue ID (UUIDv7)
    pub revenue_id: Uuid,

    /// Order that produced the commission
    pub order_id: Uuid,

    /// Source tag
    pub source: RevenueSource,

    /// Commission amount
    pub amount: Decimal,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Read model for an owner's wallet: cached balance plus movement history
///
/// Movements are most-recent-first. An owner with no wallet yet gets a zero
/// extract, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletExtract {
    /// Current balance
    pub balance: Decimal,

    /// Movement history, most recent first
    pub movements: Vec<Movement>,
}

impl WalletExtract {
    /// Extract for an owner with no wallet activity
    pub fn empty() -> Self {
        Self {
            balance: Decimal::ZERO,
            movements: Vec::new(),
        }
    }
}
