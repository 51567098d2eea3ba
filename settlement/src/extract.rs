//! Extract/query service
//!
//! Read-only facade over the ledger store for the dashboard collaborators.
//! No write access; owners with no wallet yet get a zero extract.

use crate::Result;
use std::sync::Arc;
use uuid::Uuid;
use wallet_ledger::{LedgerStore, OwnerId, OwnerType, PlatformRevenue, WalletExtract};

/// Read-side API for wallet balances and movement history
pub struct ExtractService {
    /// Ledger store
    ledger: Arc<LedgerStore>,
}

impl ExtractService {
    /// Create a service over the shared ledger store
    pub fn new(ledger: Arc<LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Balance and movement history for an owner, most recent first
    ///
    /// Absence of activity is a valid state: an unknown owner gets
    /// `{balance: 0, movements: []}`, never an error.
    pub fn balance_extract(
        &self,
        owner_type: OwnerType,
        owner_id: &OwnerId,
    ) -> Result<WalletExtract> {
        Ok(self.ledger.get_extract(owner_type, owner_id)?)
    }

    /// Commission records for an order (admin dashboards)
    pub fn platform_revenue(&self, order_id: Uuid) -> Result<Vec<PlatformRevenue>> {
        Ok(self.ledger.revenue_for_order(order_id)?)
    }
}

impl std::fmt::Debug for ExtractService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use wallet_ledger::{Config as LedgerConfig, MovementKind};

    fn test_service() -> (ExtractService, Arc<LedgerStore>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = LedgerConfig::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let ledger = Arc::new(LedgerStore::open(config).unwrap());
        (ExtractService::new(ledger.clone()), ledger, temp_dir)
    }

    #[test]
    fn test_unknown_owner_gets_zero_extract() {
        let (service, _ledger, _temp) = test_service();

        let extract = service
            .balance_extract(OwnerType::Customer, &OwnerId::new("brand-new"))
            .unwrap();
        assert_eq!(extract.balance, Decimal::ZERO);
        assert!(extract.movements.is_empty());
    }

    #[test]
    fn test_extract_reflects_ledger_activity() {
        let (service, ledger, _temp) = test_service();
        let owner = OwnerId::new("drv-1");
        let wallet = ledger
            .get_or_create_wallet(OwnerType::Driver, &owner)
            .unwrap();

        ledger
            .credit(wallet.wallet_id, Decimal::new(1000, 2), MovementKind::Payout, "order 1")
            .unwrap();
        ledger
            .credit(wallet.wallet_id, Decimal::new(1500, 2), MovementKind::Payout, "order 2")
            .unwrap();

        let extract = service.balance_extract(OwnerType::Driver, &owner).unwrap();
        assert_eq!(extract.balance, Decimal::new(2500, 2));
        assert_eq!(extract.movements.len(), 2);
        // Most recent first
        assert_eq!(extract.movements[0].description, "order 2");
    }

    #[test]
    fn test_extract_serializes_to_dashboard_contract() {
        let (service, ledger, _temp) = test_service();
        let owner = OwnerId::new("cus-1");
        let wallet = ledger
            .get_or_create_wallet(OwnerType::Customer, &owner)
            .unwrap();
        ledger
            .credit(wallet.wallet_id, Decimal::new(500, 2), MovementKind::Cashback, "order 9")
            .unwrap();

        let extract = service.balance_extract(OwnerType::Customer, &owner).unwrap();
        let json = serde_json::to_value(&extract).unwrap();

        assert!(json.get("balance").is_some());
        let movements = json.get("movements").unwrap().as_array().unwrap();
        assert_eq!(movements.len(), 1);
        for field in ["movement_id", "kind", "amount", "direction", "description", "created_at"] {
            assert!(movements[0].get(field).is_some(), "missing field {}", field);
        }
    }
}
