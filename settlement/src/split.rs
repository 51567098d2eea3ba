//! Split calculator
//!
//! Pure computation of vendor/driver/platform/cashback shares from an order
//! total and a configured rate table. No storage access, no side effects.
//!
//! # Rounding
//!
//! Each share is rounded to the cent, half-up. The platform share is then
//! derived as `total - vendor - driver`, so it absorbs the rounding residual
//! and the three split shares always sum to the total exactly. Cashback is
//! rounded the same way but funded from platform margin, outside the split.
//!
//! # Example
//!
//! ```text
//! total = 100.00, rates = {vendor: 0.80, driver: 0.10, platform: 0.10}
//! vendor = 80.00, driver = 10.00, platform = 10.00   (sum == 100.00)
//! cashback = 5.00 at rate 0.05, credited separately
//! ```

use crate::{
    types::{SplitAmounts, SplitRates},
    Result,
};
use rust_decimal::{Decimal, RoundingStrategy};
use wallet_ledger::Error as LedgerError;

/// Monetary scale: BRL cents
const MONEY_SCALE: u32 = 2;

/// Compute the share amounts for an order total
///
/// The total must be non-negative. The returned shares satisfy
/// `vendor + driver + platform == total` exactly.
pub fn compute_split(total: Decimal, rates: &SplitRates) -> Result<SplitAmounts> {
    if total < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(total).into());
    }

    let vendor_amount = round_to_cent(total * rates.vendor_share);
    let driver_amount = round_to_cent(total * rates.driver_share);

    // Platform takes the remainder so the split conserves the total
    let platform_amount = total - vendor_amount - driver_amount;

    let cashback_amount = round_to_cent(total * rates.cashback_rate);

    Ok(SplitAmounts {
        vendor_amount,
        driver_amount,
        platform_amount,
        cashback_amount,
    })
}

fn round_to_cent(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brl(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_production_example() {
        // R$100.00 at the production default rates
        let split = compute_split(brl(10000), &SplitRates::default()).unwrap();

        assert_eq!(split.vendor_amount, brl(8000));
        assert_eq!(split.driver_amount, brl(1000));
        assert_eq!(split.platform_amount, brl(1000));
        assert_eq!(split.cashback_amount, brl(500));
        assert_eq!(split.settled_total(), brl(10000));
    }

    #[test]
    fn test_residual_cent_goes_to_platform() {
        // 0.99 * 0.80 = 0.792 -> 0.79; 0.99 * 0.10 = 0.099 -> 0.10
        let split = compute_split(brl(99), &SplitRates::default()).unwrap();

        assert_eq!(split.vendor_amount, brl(79));
        assert_eq!(split.driver_amount, brl(10));
        assert_eq!(split.platform_amount, brl(10));
        assert_eq!(split.settled_total(), brl(99));
    }

    #[test]
    fn test_half_cent_rounds_up() {
        // 0.05 * 0.10 = 0.005, half-up to 0.01
        let split = compute_split(brl(5), &SplitRates::default()).unwrap();

        assert_eq!(split.vendor_amount, brl(4));
        assert_eq!(split.driver_amount, brl(1));
        assert_eq!(split.platform_amount, brl(0));
        assert_eq!(split.settled_total(), brl(5));
    }

    #[test]
    fn test_zero_total() {
        let split = compute_split(Decimal::ZERO, &SplitRates::default()).unwrap();

        assert_eq!(split.vendor_amount, Decimal::ZERO);
        assert_eq!(split.driver_amount, Decimal::ZERO);
        assert_eq!(split.platform_amount, Decimal::ZERO);
        assert_eq!(split.cashback_amount, Decimal::ZERO);
    }

    #[test]
    fn test_negative_total_rejected() {
        let result = compute_split(brl(-100), &SplitRates::default());
        assert!(matches!(
            result,
            Err(crate::Error::Ledger(LedgerError::InvalidAmount(_)))
        ));
    }

    #[test]
    fn test_cashback_does_not_reduce_split() {
        let no_cashback = SplitRates {
            cashback_rate: Decimal::ZERO,
            ..SplitRates::default()
        };
        let with_cashback = SplitRates::default();

        let a = compute_split(brl(10000), &no_cashback).unwrap();
        let b = compute_split(brl(10000), &with_cashback).unwrap();

        assert_eq!(a.vendor_amount, b.vendor_amount);
        assert_eq!(a.driver_amount, b.driver_amount);
        assert_eq!(a.platform_amount, b.platform_amount);
        assert_eq!(a.cashback_amount, Decimal::ZERO);
        assert_eq!(b.cashback_amount, brl(500));
    }

    proptest! {
        #[test]
        fn prop_split_is_exact_at_default_rates(cents in 0i64..=100_000_000) {
            let split = compute_split(brl(cents), &SplitRates::default()).unwrap();
            prop_assert_eq!(split.settled_total(), brl(cents));
        }

        #[test]
        fn prop_split_is_exact_for_valid_rates(
            cents in 0i64..=100_000_000,
            vendor_bp in 0u32..=10_000,
            driver_bp in 0u32..=10_000,
            cashback_bp in 0u32..=10_000,
        ) {
            prop_assume!(vendor_bp + driver_bp <= 10_000);

            let rates = SplitRates {
                vendor_share: Decimal::new(vendor_bp as i64, 4),
                driver_share: Decimal::new(driver_bp as i64, 4),
                platform_share: Decimal::new((10_000 - vendor_bp - driver_bp) as i64, 4),
                cashback_rate: Decimal::new(cashback_bp as i64, 4),
            };
            rates.validate().unwrap();

            let total = brl(cents);
            let split = compute_split(total, &rates).unwrap();

            // Exact conservation, regardless of rounding direction
            prop_assert_eq!(split.settled_total(), total);
            prop_assert!(split.vendor_amount >= Decimal::ZERO);
            prop_assert!(split.driver_amount >= Decimal::ZERO);
            prop_assert!(split.cashback_amount >= Decimal::ZERO);
        }
    }
}
