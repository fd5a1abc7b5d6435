//! # Cost Averager
//!
//! Applies a restock: adds incoming stock and moves the item's cost price
//! (`hargaPokok`) to the weighted average of what is on hand and what came
//! in.
//!
//! ```text
//! Freon R32   stock 10 @ 5000
//! restock      qty  5 @ 8000
//!             ─────────────────
//!             stock 15 @ (10×5000 + 5×8000) / 15 = 6000
//! ```
//!
//! The read and the write happen in one `BEGIN IMMEDIATE` transaction, so
//! concurrent restocks and sales of the item queue on the write lock. The
//! write is still guarded by the item's version; a stale read makes the
//! attempt run again on fresh numbers.

use tracing::info;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::retry::{with_retry, AttemptError};
use niaga_core::costing::StockPosition;
use niaga_core::validation::validate_restock;
use niaga_core::{CoreError, Item, Restock};
use niaga_db::codec;
use niaga_db::{Database, DbError, ItemRepository};

/// Applies restocks with weighted-average costing.
#[derive(Debug, Clone)]
pub struct CostAverager {
    db: Database,
    config: ServiceConfig,
}

impl CostAverager {
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        CostAverager { db, config }
    }

    /// Restocks an item, whatever business it belongs to.
    ///
    /// ## Errors
    /// * `VALIDATION_ERROR` - `qty ≤ 0` or a negative price
    /// * `NOT_FOUND` - no such item, nothing changed
    /// * `CONFLICT` - concurrent writes outlasted every retry
    pub async fn restock(&self, item_id: &str, restock: Restock) -> Result<Item, ApiError> {
        self.apply(None, item_id, restock).await
    }

    /// Restocks an item only if it belongs to `business_id`.
    pub async fn restock_in_business(
        &self,
        business_id: &str,
        item_id: &str,
        restock: Restock,
    ) -> Result<Item, ApiError> {
        self.apply(Some(business_id), item_id, restock).await
    }

    async fn apply(
        &self,
        business_id: Option<&str>,
        item_id: &str,
        restock: Restock,
    ) -> Result<Item, ApiError> {
        validate_restock(&restock)?;

        let item = with_retry("restock", self.config.max_write_attempts, move || {
            self.attempt_restock(business_id, item_id, restock)
        })
        .await?;

        info!(
            item_id = %item.id,
            qty = %restock.qty,
            harga_beli = %restock.purchase_price,
            stock = %item.stock,
            harga_pokok = %item.cost_price,
            "Restock applied"
        );

        Ok(item)
    }

    async fn attempt_restock(
        &self,
        business_id: Option<&str>,
        item_id: &str,
        restock: Restock,
    ) -> Result<Item, AttemptError> {
        let mut tx = self.db.begin_immediate().await?;

        let mut item = ItemRepository::fetch_in(&mut tx, item_id)
            .await?
            .filter(|item| business_id.map_or(true, |id| item.business_id == id))
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        let after = StockPosition::new(item.stock, item.cost_price)
            .receive(restock.qty, restock.purchase_price)?;
        let selling_price = restock.selling_price.unwrap_or(item.selling_price);
        let now = codec::now();

        let version = ItemRepository::write_position_in(
            &mut tx,
            &item.id,
            item.version,
            after.stock,
            after.average_cost,
            selling_price,
            now,
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        item.stock = after.stock;
        item.cost_price = after.average_cost;
        item.selling_price = selling_price;
        item.updated_at = now;
        item.version = version;
        Ok(item)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{file_fixture, fixture, item_with_stock};
    use niaga_core::{Money, Quantity};
    use rust_decimal_macros::dec;

    fn restock(qty: i64, price: i64) -> Restock {
        Restock {
            qty: Quantity::from_units(qty),
            purchase_price: Money::from_units(price),
            selling_price: None,
        }
    }

    #[tokio::test]
    async fn test_weighted_average_restock() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let updated = f
            .services
            .restocks()
            .restock(&freon.id, restock(5, 8_000))
            .await
            .unwrap();

        assert_eq!(updated.stock, Quantity::from_units(15));
        assert_eq!(updated.cost_price, Money::from_units(6_000));
        assert_eq!(updated.selling_price, freon.selling_price);
        assert_eq!(updated.version, freon.version + 1);

        let stored = f.services.db().items().get_by_id(&freon.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_restock_from_empty_takes_incoming_price() {
        let f = fixture().await;
        let item = item_with_stock(&f, "AC-002", "Kapasitor", 0, 0).await;

        let updated = f
            .services
            .restocks()
            .restock(&item.id, restock(4, 12_500))
            .await
            .unwrap();

        assert_eq!(updated.stock, Quantity::from_units(4));
        assert_eq!(updated.cost_price, Money::from_units(12_500));
    }

    #[tokio::test]
    async fn test_restock_keeps_full_precision() {
        let f = fixture().await;
        let item = item_with_stock(&f, "AC-003", "Pipa", 1, 1_000).await;

        let updated = f
            .services
            .restocks()
            .restock(&item.id, restock(2, 1_001))
            .await
            .unwrap();

        // (1000 + 2002) / 3
        let expected = dec!(3002) / dec!(3);
        assert_eq!(updated.cost_price, Money::from_decimal(expected));
    }

    #[tokio::test]
    async fn test_restock_can_set_selling_price() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let mut event = restock(5, 8_000);
        event.selling_price = Some(Money::from_units(15_000));
        let updated = f.services.restocks().restock(&freon.id, event).await.unwrap();

        assert_eq!(updated.selling_price, Money::from_units(15_000));
    }

    #[tokio::test]
    async fn test_restock_errors_change_nothing() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let missing = f
            .services
            .restocks()
            .restock("6b9a0c1e-0000-4000-8000-000000000000", restock(5, 8_000))
            .await
            .unwrap_err();
        assert_eq!(missing.code, ErrorCode::NotFound);

        let invalid = f
            .services
            .restocks()
            .restock(&freon.id, restock(0, 8_000))
            .await
            .unwrap_err();
        assert_eq!(invalid.code, ErrorCode::ValidationError);

        let other = f.services.db().businesses().create("Moza Variasi").await.unwrap();
        let foreign = f
            .services
            .restocks()
            .restock_in_business(&other.id, &freon.id, restock(5, 8_000))
            .await
            .unwrap_err();
        assert_eq!(foreign.code, ErrorCode::NotFound);

        let stored = f.services.db().items().get_by_id(&freon.id).await.unwrap().unwrap();
        assert_eq!(stored, freon);
    }

    #[tokio::test]
    async fn test_concurrent_restocks_both_apply() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let averager = f.services.restocks();
        let (a, b) = tokio::join!(
            averager.restock(&freon.id, restock(5, 8_000)),
            averager.restock(&freon.id, restock(5, 8_000)),
        );
        a.unwrap();
        b.unwrap();

        let stored = f.services.db().items().get_by_id(&freon.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, Quantity::from_units(20));
        // (10×5000 + 10×8000) / 20
        assert_eq!(stored.cost_price, Money::from_units(6_500));
        assert_eq!(stored.version, freon.version + 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_restocks_on_shared_file_all_apply() {
        let f = file_fixture(5).await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 8_000).await;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let services = f.services.clone();
                let item_id = freon.id.clone();
                tokio::spawn(async move {
                    services.restocks().restock(&item_id, restock(1, 8_000)).await
                })
            })
            .collect();

        for handle in handles {
            let outcome = handle.await.unwrap();
            assert!(outcome.is_ok(), "restock failed: {outcome:?}");
        }

        let stored = f.services.db().items().get_by_id(&freon.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, Quantity::from_units(30));
        assert_eq!(stored.cost_price, Money::from_units(8_000));
        assert_eq!(stored.version, freon.version + 20);
    }
}
