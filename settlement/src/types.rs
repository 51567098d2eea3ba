//! Core types for the settlement engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wallet_ledger::OwnerId;

/// Order status reported by the order-management subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    /// Placed, awaiting vendor acceptance
    Pending = 1,
    /// Accepted by the vendor
    Accepted = 2,
    /// Picked up, on the way
    InTransit = 3,
    /// Delivered to the customer (settlement precondition)
    Delivered = 4,
    /// Cancelled before delivery
    Cancelled = 5,
}

/// Read-only view of a completed order
///
/// Owned by the order-management subsystem; the settlement engine reads these
/// fields and never touches the order lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrder {
    /// Order ID
    pub order_id: Uuid,

    /// Paying customer
    pub customer_id: OwnerId,

    /// Vendor / market that fulfilled the order
    pub vendor_id: OwnerId,

    /// Driver that delivered the order
    pub driver_id: OwnerId,

    /// Total paid by the customer
    pub total_amount: Decimal,

    /// Current order status
    pub status: OrderStatus,
}

/// Configured split rates
///
/// Fractions of the order total allocated to each party. They need not sum
/// to 1: cashback is funded from platform margin, not carved out of the
/// customer total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRates {
    /// Vendor share of the order total
    pub vendor_share: Decimal,

    /// Driver share of the order total
    pub driver_share: Decimal,

    /// Platform share of the order total
    pub platform_share: Decimal,

    /// Cashback rate credited to the customer, platform-funded
    pub cashback_rate: Decimal,
}

impl Default for SplitRates {
    fn default() -> Self {
        Self {
            vendor_share: Decimal::new(80, 2),  // 0.80
            driver_share: Decimal::new(10, 2),  // 0.10
            platform_share: Decimal::new(10, 2), // 0.10
            cashback_rate: Decimal::new(5, 2),  // 0.05
        }
    }
}

impl SplitRates {
    /// Validate the rate table
    ///
    /// Rejects negative fractions and vendor+driver shares above 1, which
    /// would force a negative platform residual on every order.
    pub fn validate(&self) -> crate::Result<()> {
        let rates = [
            ("vendor_share", self.vendor_share),
            ("driver_share", self.driver_share),
            ("platform_share", self.platform_share),
            ("cashback_rate", self.cashback_rate),
        ];

        for (name, rate) in rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(crate::Error::InvalidRates(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }

        if self.vendor_share + self.driver_share > Decimal::ONE {
            return Err(crate::Error::InvalidRates(format!(
                "vendor_share + driver_share exceeds 1 ({} + {})",
                self.vendor_share, self.driver_share
            )));
        }

        Ok(())
    }
}

/// Computed share amounts for one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAmounts {
    /// Vendor share
    pub vendor_amount: Decimal,

    /// Driver share
    pub driver_amount: Decimal,

    /// Platform share (absorbs the rounding residual)
    pub platform_amount: Decimal,

    /// Customer cashback, platform-funded
    pub cashback_amount: Decimal,
}

impl SplitAmounts {
    /// Sum of the shares carved from the order total
    ///
    /// Cashback is excluded: it is funded separately.
    pub fn settled_total(&self) -> Decimal {
        self.vendor_amount + self.driver_amount + self.platform_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates_are_valid() {
        let rates = SplitRates::default();
        rates.validate().unwrap();
        assert_eq!(rates.vendor_share, Decimal::new(80, 2));
        assert_eq!(rates.cashback_rate, Decimal::new(5, 2));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let rates = SplitRates {
            driver_share: Decimal::new(-10, 2),
            ..SplitRates::default()
        };
        assert!(matches!(
            rates.validate(),
            Err(crate::Error::InvalidRates(_))
        ));
    }

    #[test]
    fn test_overcommitted_split_rejected() {
        let rates = SplitRates {
            vendor_share: Decimal::new(95, 2),
            driver_share: Decimal::new(10, 2),
            ..SplitRates::default()
        };
        assert!(matches!(
            rates.validate(),
            Err(crate::Error::InvalidRates(_))
        ));
    }
}
