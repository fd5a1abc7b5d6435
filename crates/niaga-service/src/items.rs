//! # Item Catalog
//!
//! Create, find, edit and retire catalog items. Reads come back shaped for
//! the caller's role: an admin never receives `hargaPokok`.
//!
//! Stock and cost are not editable here. They move only through
//! [`CostAverager`](crate::restock::CostAverager) and
//! [`SaleRecorder`](crate::sales::SaleRecorder).

use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::restock::CostAverager;
use crate::retry::{with_retry, AttemptError};
use niaga_core::validation::{
    validate_item_patch, validate_new_item, validate_search_query, validate_uuid,
};
use niaga_core::{CoreError, Item, ItemPatch, NewItem, Restock, Role, RoleView};
use niaga_db::codec;
use niaga_db::repository::item::generate_item_id;
use niaga_db::{Database, DbError, ItemRepository};

/// Catalog operations for one store.
#[derive(Debug, Clone)]
pub struct ItemService {
    db: Database,
    config: ServiceConfig,
    averager: CostAverager,
}

impl ItemService {
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        let averager = CostAverager::new(db.clone(), config.clone());
        ItemService {
            db,
            config,
            averager,
        }
    }

    /// Adds an item with its opening stock and cost.
    ///
    /// ## Errors
    /// * `VALIDATION_ERROR` - bad field
    /// * `NOT_FOUND` - unknown business
    /// * `CONFLICT` - `kodeItem` already used in this business
    pub async fn create(&self, new_item: NewItem) -> Result<Item, ApiError> {
        validate_new_item(&new_item)?;

        if !self.db.businesses().exists(&new_item.business_id).await? {
            return Err(CoreError::BusinessNotFound(new_item.business_id).into());
        }

        let now = codec::now();
        let item = Item {
            id: generate_item_id(),
            business_id: new_item.business_id,
            code: new_item.code.trim().to_string(),
            barcode: trimmed(new_item.barcode),
            name: new_item.name.trim().to_string(),
            stock: new_item.stock,
            unit: new_item.unit.trim().to_string(),
            brand: trimmed(new_item.brand),
            warranty: trimmed(new_item.warranty),
            cost_price: new_item.cost_price,
            selling_price: new_item.selling_price,
            currency: new_item
                .currency
                .unwrap_or_else(|| self.config.default_currency.clone()),
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let item = self.db.items().insert(&item).await?;
        info!(item_id = %item.id, kode_item = %item.code, "Item created");
        Ok(item)
    }

    /// One item of the business.
    pub async fn get(
        &self,
        business_id: &str,
        id: &str,
        role: Role,
    ) -> Result<RoleView<Item>, ApiError> {
        let item = self.find(business_id, id).await?;
        Ok(RoleView::for_role(role, item))
    }

    /// Case-insensitive search on name, code and barcode, ordered by name.
    /// An empty or absent query lists the whole catalog.
    pub async fn search(
        &self,
        business_id: &str,
        query: Option<&str>,
        role: Role,
    ) -> Result<RoleView<Vec<Item>>, ApiError> {
        let query = validate_search_query(query.unwrap_or_default())
            .map_err(CoreError::from)?;

        let items = self.db.items().search(business_id, &query).await?;
        debug!(business_id = %business_id, count = items.len(), "Item search");

        Ok(RoleView::for_role(role, items))
    }

    /// Edits catalog attributes. Stock and cost are never touched.
    pub async fn update(
        &self,
        business_id: &str,
        id: &str,
        patch: ItemPatch,
        role: Role,
    ) -> Result<RoleView<Item>, ApiError> {
        validate_item_patch(&patch)?;

        let patch = &patch;
        let item = with_retry("update_item", self.config.max_write_attempts, move || {
            self.attempt_update(business_id, id, patch.clone())
        })
        .await?;

        info!(item_id = %item.id, version = item.version, "Item updated");
        Ok(RoleView::for_role(role, item))
    }

    async fn attempt_update(
        &self,
        business_id: &str,
        id: &str,
        patch: ItemPatch,
    ) -> Result<Item, AttemptError> {
        let mut item = self.find(business_id, id).await?;
        patch.apply_to(&mut item);
        Ok(self.db.items().update_details(&item).await?)
    }

    /// Deletes an item that has never been sold.
    ///
    /// ## Errors
    /// * `NOT_FOUND` - no such item in this business
    /// * `CONFLICT` - the item appears on a sale; deactivate it instead
    pub async fn remove(&self, business_id: &str, id: &str) -> Result<(), ApiError> {
        validate_uuid("id", id).map_err(CoreError::from)?;

        let code = with_retry("remove_item", self.config.max_write_attempts, move || {
            self.attempt_remove(business_id, id)
        })
        .await?;

        info!(item_id = %id, kode_item = %code, "Item removed");
        Ok(())
    }

    async fn attempt_remove(&self, business_id: &str, id: &str) -> Result<String, AttemptError> {
        // Holds the write lock so no sale of the item can land between the
        // history check and the delete
        let mut tx = self.db.begin_immediate().await?;

        let item = ItemRepository::fetch_in(&mut tx, id)
            .await?
            .filter(|item| item.business_id == business_id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;

        if ItemRepository::count_sale_lines_in(&mut tx, id).await? > 0 {
            return Err(CoreError::ItemHasSalesHistory { item: item.code }.into());
        }

        ItemRepository::delete_in(&mut tx, business_id, id).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(item.code)
    }

    /// Restocks an item of the business. See [`CostAverager::restock`].
    pub async fn restock(
        &self,
        business_id: &str,
        id: &str,
        restock: Restock,
        role: Role,
    ) -> Result<RoleView<Item>, ApiError> {
        let item = self
            .averager
            .restock_in_business(business_id, id, restock)
            .await?;
        Ok(RoleView::for_role(role, item))
    }

    async fn find(&self, business_id: &str, id: &str) -> Result<Item, ApiError> {
        self.db
            .items()
            .get_in_business(business_id, id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()).into())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{file_fixture, fixture, item_with_stock, new_item, sale_of};
    use niaga_core::{Money, Quantity};

    #[tokio::test]
    async fn test_create_defaults() {
        let f = fixture().await;
        let mut input = new_item(&f.business.id, "  AC-010 ", "Remote AC");
        input.brand = Some("   ".to_string());
        input.currency = None;

        let item = f.services.items().create(input).await.unwrap();

        assert_eq!(item.code, "AC-010");
        assert_eq!(item.brand, None);
        assert_eq!(item.currency, "IDR");
        assert_eq!(item.cost_price, Money::zero());
        assert!(item.is_active);
        assert_eq!(item.version, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code_and_unknown_business() {
        let f = fixture().await;
        item_with_stock(&f, "AC-001", "Freon R32", 1, 1).await;

        let dup = f
            .services
            .items()
            .create(new_item(&f.business.id, "AC-001", "Freon R22"))
            .await
            .unwrap_err();
        assert_eq!(dup.code, ErrorCode::Conflict);
        assert!(dup.message.contains("AC-001"));

        let unknown = f
            .services
            .items()
            .create(new_item("6b9a0c1e-0000-4000-8000-000000000000", "AC-002", "Kapasitor"))
            .await
            .unwrap_err();
        assert_eq!(unknown.code, ErrorCode::NotFound);

        let mut negative = new_item(&f.business.id, "AC-003", "Pipa");
        negative.stock = Quantity::from_units(-1);
        let invalid = f.services.items().create(negative).await.unwrap_err();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_get_and_search_hide_cost_from_admin() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let owner = f
            .services
            .items()
            .get(&f.business.id, &freon.id, Role::Owner)
            .await
            .unwrap();
        assert_eq!(owner.full(), Some(&freon));

        let admin = f
            .services
            .items()
            .get(&f.business.id, &freon.id, Role::Admin)
            .await
            .unwrap();
        let json = serde_json::to_value(&admin).unwrap();
        assert!(json.get("hargaPokok").is_none());
        assert_eq!(json["hargaJual"], serde_json::json!("10000"));

        let found = f
            .services
            .items()
            .search(&f.business.id, Some("freon"), Role::Admin)
            .await
            .unwrap();
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert!(json[0].get("hargaPokok").is_none());

        let all = f
            .services
            .items()
            .search(&f.business.id, None, Role::Owner)
            .await
            .unwrap();
        assert_eq!(all.full().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_business() {
        let f = fixture().await;
        let other = f.services.db().businesses().create("Moza Variasi").await.unwrap();
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let err = f
            .services
            .items()
            .get(&other.id, &freon.id, Role::Owner)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_never_touches_stock_or_cost() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        let patch = ItemPatch {
            name: Some("Freon R32 1kg".to_string()),
            brand: Some(Some("Daikin".to_string())),
            selling_price: Some(Money::from_units(12_000)),
            is_active: Some(false),
            ..ItemPatch::default()
        };
        let view = f
            .services
            .items()
            .update(&f.business.id, &freon.id, patch, Role::Owner)
            .await
            .unwrap();
        let updated = view.into_full().unwrap();

        assert_eq!(updated.name, "Freon R32 1kg");
        assert_eq!(updated.brand.as_deref(), Some("Daikin"));
        assert_eq!(updated.selling_price, Money::from_units(12_000));
        assert!(!updated.is_active);
        assert_eq!(updated.stock, freon.stock);
        assert_eq!(updated.cost_price, freon.cost_price);
        assert_eq!(updated.version, freon.version + 1);
    }

    #[tokio::test]
    async fn test_remove_without_history() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

        f.services.items().remove(&f.business.id, &freon.id).await.unwrap();

        let err = f
            .services
            .items()
            .remove(&f.business.id, &freon.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_remove_with_history_is_conflict() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;
        f.services
            .sales()
            .record(sale_of(&f.business.id, &[(&freon.id, 1)]))
            .await
            .unwrap();

        let err = f
            .services
            .items()
            .remove(&f.business.id, &freon.id)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.message.contains("deactivate"));
        assert!(f.services.db().items().get_by_id(&freon.id).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_remove_racing_a_sale_keeps_history_consistent() {
        for _ in 0..5 {
            let f = file_fixture(4).await;
            let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;

            let sale = {
                let services = f.services.clone();
                let request = sale_of(&f.business.id, &[(&freon.id, 1)]);
                tokio::spawn(async move { services.sales().record(request).await })
            };
            let removal = {
                let services = f.services.clone();
                let business_id = f.business.id.clone();
                let item_id = freon.id.clone();
                tokio::spawn(async move { services.items().remove(&business_id, &item_id).await })
            };
            let sale = sale.await.unwrap();
            let removal = removal.await.unwrap();

            let stored = f.services.db().items().get_by_id(&freon.id).await.unwrap();
            let sales = f.services.sales().list(&f.business.id).await.unwrap();

            match (&sale, &removal) {
                (Ok(_), Err(err)) => {
                    assert_eq!(err.code, ErrorCode::Conflict);
                    assert_eq!(stored.unwrap().stock, Quantity::from_units(9));
                    assert_eq!(sales.len(), 1);
                }
                (Err(err), Ok(())) => {
                    assert_eq!(err.code, ErrorCode::NotFound);
                    assert!(stored.is_none());
                    assert!(sales.is_empty());
                }
                other => panic!("inconsistent outcome: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_restock_through_catalog_respects_role() {
        let f = fixture().await;
        let freon = item_with_stock(&f, "AC-001", "Freon R32", 10, 5_000).await;
        let event = Restock {
            qty: Quantity::from_units(5),
            purchase_price: Money::from_units(8_000),
            selling_price: None,
        };

        let view = f
            .services
            .items()
            .restock(&f.business.id, &freon.id, event, Role::Admin)
            .await
            .unwrap();

        assert!(view.is_redacted());
        assert_eq!(view.redacted().unwrap().stock, Quantity::from_units(15));
    }
}
