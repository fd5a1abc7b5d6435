//! # Sale Recorder
//!
//! Records a sale and takes its stock out of the catalog in one transaction.
//!
//! ## Record Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         record(NewSale)                                 │
//! │                                                                         │
//! │  validate ──► business exists? ──► price lines (pure)                   │
//! │                                          │                              │
//! │   ┌──────────────────────────────────────┘                              │
//! │   │  attempt (retried on StaleWrite / Busy / generated-number clash)    │
//! │   ▼                                                                     │
//! │  BEGIN                                                                  │
//! │   ├── insert sale header          (unique no_transaksi)                │
//! │   ├── load every referenced item  (missing/foreign → NOT_FOUND)        │
//! │   ├── insert sale lines           (cart order)                         │
//! │   ├── sum demand per item, check stock (short → INSUFFICIENT_STOCK)    │
//! │   └── CAS stock per item          (version moved → StaleWrite)         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is persisted.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::retry::{with_retry, AttemptError};
use niaga_core::costing::StockPosition;
use niaga_core::pricing::{price_sale, PricedSale};
use niaga_core::validation::validate_new_sale;
use niaga_core::{CoreError, Item, NewSale, Quantity, Sale, SaleDetail, SaleLine};
use niaga_db::codec;
use niaga_db::repository::sale::{generate_sale_id, generate_transaction_number};
use niaga_db::{Database, DbError, ItemRepository, SaleRepository};

/// Records and reads sales.
#[derive(Debug, Clone)]
pub struct SaleRecorder {
    db: Database,
    config: ServiceConfig,
}

impl SaleRecorder {
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        SaleRecorder { db, config }
    }

    /// Records a sale atomically.
    ///
    /// ## Errors
    /// * `VALIDATION_ERROR` - malformed request, nothing touched
    /// * `NOT_FOUND` - unknown business, or an item missing or owned by
    ///   another business
    /// * `INSUFFICIENT_STOCK` - an item's summed quantity exceeds its stock
    /// * `CONFLICT` - supplied `noTransaksi` already used, or write races
    ///   outlasted every retry
    pub async fn record(&self, request: NewSale) -> Result<SaleDetail, ApiError> {
        validate_new_sale(&request)?;

        if !self.db.businesses().exists(&request.business_id).await? {
            return Err(CoreError::BusinessNotFound(request.business_id).into());
        }

        let priced = price_sale(&request.lines)?;

        let request = &request;
        let priced = &priced;
        let detail = with_retry("record_sale", self.config.max_write_attempts, move || {
            self.attempt_record(request, priced)
        })
        .await?;

        info!(
            sale_id = %detail.sale.id,
            no_transaksi = %detail.sale.transaction_number,
            lines = detail.items.len(),
            grand_total = %detail.sale.grand_total,
            "Sale recorded"
        );

        Ok(detail)
    }

    /// All sales of a business, newest first, with their lines.
    pub async fn list(&self, business_id: &str) -> Result<Vec<SaleDetail>, ApiError> {
        Ok(self.db.sales().list_details(business_id).await?)
    }

    /// One sale of a business with its lines.
    pub async fn get(&self, business_id: &str, sale_id: &str) -> Result<SaleDetail, ApiError> {
        self.db
            .sales()
            .get_detail(business_id, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    async fn attempt_record(
        &self,
        request: &NewSale,
        priced: &PricedSale,
    ) -> Result<SaleDetail, AttemptError> {
        let now = codec::now();
        let supplied = request
            .transaction_number
            .as_deref()
            .map(str::trim)
            .map(str::to_string);

        let sale = Sale {
            id: generate_sale_id(),
            business_id: request.business_id.clone(),
            transaction_number: supplied.clone().unwrap_or_else(generate_transaction_number),
            customer: non_blank(request.customer.as_deref()),
            sub_total: priced.sub_total,
            grand_total: priced.grand_total,
            note: non_blank(request.note.as_deref()),
            sold_at: now,
            created_at: now,
        };

        let mut tx = self.db.begin_immediate().await?;

        if let Err(err) = SaleRepository::insert_sale_in(&mut tx, &sale).await {
            return Err(match err {
                err if !err.is_unique_violation_on("no_transaksi") => err.into(),
                _ if supplied.is_some() => {
                    CoreError::DuplicateTransactionNumber(sale.transaction_number).into()
                }
                err => {
                    debug!(no_transaksi = %sale.transaction_number, "Generated number taken");
                    AttemptError::Retry(err)
                }
            });
        }

        let items = load_items(&mut tx, &sale.business_id, priced).await?;

        let mut lines = Vec::with_capacity(priced.lines.len());
        for (line_no, priced_line) in priced.lines.iter().enumerate() {
            let line = SaleLine {
                id: generate_sale_id(),
                sale_id: sale.id.clone(),
                item_id: priced_line.item_id.clone(),
                quantity: priced_line.quantity,
                unit_price: priced_line.unit_price,
                unit: priced_line.unit.clone(),
                discount_percent: priced_line.discount_percent,
                total: priced_line.total,
                note: non_blank(priced_line.note.as_deref()),
                created_at: now,
            };
            SaleRepository::insert_line_in(&mut tx, &line, line_no).await?;
            lines.push(line);
        }

        for (item, requested) in &items {
            let after = StockPosition::new(item.stock, item.cost_price).issue(&item.name, *requested)?;

            ItemRepository::write_position_in(
                &mut tx,
                &item.id,
                item.version,
                after.stock,
                item.cost_price,
                item.selling_price,
                now,
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(SaleDetail { sale, items: lines })
    }
}

/// Loads each distinct item of the cart with its summed demand, in order of
/// first appearance.
async fn load_items(
    conn: &mut SqliteConnection,
    business_id: &str,
    priced: &PricedSale,
) -> Result<Vec<(Item, Quantity)>, AttemptError> {
    let mut order: Vec<&str> = Vec::new();
    let mut demand: HashMap<&str, Quantity> = HashMap::new();

    for line in &priced.lines {
        let total = demand.entry(line.item_id.as_str()).or_insert_with(|| {
            order.push(line.item_id.as_str());
            Quantity::zero()
        });
        *total = total
            .checked_add(line.quantity)
            .ok_or(CoreError::AmountOverflow {
                context: "requested quantity",
            })?;
    }

    let mut items = Vec::with_capacity(order.len());
    for item_id in order {
        let item = ItemRepository::fetch_in(conn, item_id)
            .await?
            .filter(|item| item.business_id == business_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        let requested = demand.get(item_id).copied().unwrap_or_default();
        items.push((item, requested));
    }

    Ok(items)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
