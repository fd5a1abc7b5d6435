//! # Reports
//!
//! Inventory valuation, dashboard figures and printable receipts.
//!
//! ## Where "today" starts
//! ```text
//! now (UTC)        2024-03-01T20:30Z
//! store offset     +07:00
//! local time       2024-03-02 03:30
//! local midnight   2024-03-02 00:00+07:00
//! since (UTC)      2024-03-01T17:00Z   ← sales with tanggal >= this count
//! ```
//!
//! Callers pass `now` so the figures are reproducible in tests.

use chrono::{DateTime, Duration, FixedOffset, Offset, TimeZone, Utc};
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use niaga_core::{CoreError, DashboardStats, InventoryRow, Item, Receipt, Role, RoleView};
use niaga_db::Database;

/// Read-only reports over one business.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    config: ServiceConfig,
}

impl ReportService {
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        ReportService { db, config }
    }

    /// Inventory valuation sheet: one row per item, ordered by name.
    ///
    /// Admins get the rows without `hpp` and `nilai`.
    pub async fn inventory(
        &self,
        business_id: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<RoleView<Vec<InventoryRow>>, ApiError> {
        let items = self.db.items().list_by_business(business_id).await?;

        let rows = items
            .into_iter()
            .map(|item| inventory_row(item, now))
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(RoleView::for_role(role, rows))
    }

    /// Today's sales figures plus the dashboard's short lists.
    pub async fn dashboard(
        &self,
        business_id: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<RoleView<DashboardStats>, ApiError> {
        let offset = self.config.local_offset().unwrap_or_else(|| Utc.fix());
        let since = local_day_start(now, offset);
        let limit = self.config.dashboard_list_limit;

        debug!(business_id = %business_id, since = %since, "Building dashboard");

        let reports = self.db.reports();
        let today = reports.sales_totals_since(business_id, since).await?;
        let items = self.db.items().list_by_business(business_id).await?;
        let recent_sales = reports.recent_sales(business_id, limit).await?;
        let top_items = reports.top_items(business_id, limit as usize).await?;

        let total_items = items.len() as i64;
        let mut low_stock: Vec<Item> = items
            .into_iter()
            .filter(|item| item.stock <= self.config.low_stock_threshold)
            .collect();
        let low_stock_count = low_stock.len() as i64;

        low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
        low_stock.truncate(limit as usize);

        let stats = DashboardStats {
            total_sales: today.grand_total,
            transaction_count: today.count,
            total_items,
            low_stock_count,
            low_stock_list: low_stock,
            recent_sales,
            top_items,
        };

        Ok(RoleView::for_role(role, stats))
    }

    /// Printable receipt of a sale. Carries no cost data, so it is the same
    /// for every role.
    pub async fn receipt(&self, business_id: &str, sale_id: &str) -> Result<Receipt, ApiError> {
        let detail = self
            .db
            .sales()
            .get_detail(business_id, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let business = self
            .db
            .businesses()
            .get_by_id(business_id)
            .await?
            .ok_or_else(|| CoreError::BusinessNotFound(business_id.to_string()))?;

        let items = self.db.reports().receipt_lines(&detail.sale.id).await?;

        Ok(Receipt {
            store_name: business.name,
            transaction_no: detail.sale.transaction_number,
            date: detail.sale.sold_at,
            pelanggan: detail
                .sale
                .customer
                .unwrap_or_else(|| self.config.walk_in_customer.clone()),
            items,
            total: detail.sale.grand_total,
        })
    }
}

fn inventory_row(item: Item, now: DateTime<Utc>) -> Result<InventoryRow, CoreError> {
    let value = item.stock_value().ok_or(CoreError::AmountOverflow {
        context: "inventory value",
    })?;

    Ok(InventoryRow {
        age_days: (now - item.created_at).num_days().max(0),
        value,
        cost: item.cost_price,
        stock: item.stock,
        note: item.brand.unwrap_or_else(|| "-".to_string()),
        code: item.code,
        name: item.name,
        unit: item.unit,
    })
}

/// Midnight of `now`'s local date at `offset`, as a UTC instant.
pub fn local_day_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    let local_midnight = local_date.and_time(chrono::NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc_midnight)
}

// =============================================================================
// Unit Tests
// =============================================================================
