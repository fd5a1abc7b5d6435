//! Shared fixtures for the service tests.

use tempfile::TempDir;

use niaga_core::{Business, Item, Money, NewItem, NewSale, NewSaleLine, Quantity};

use crate::config::ServiceConfig;
use crate::Services;

pub(crate) struct Fixture {
    pub services: Services,
    pub business: Business,
    // Removed with the fixture
    _dir: Option<TempDir>,
}

/// Fresh in-memory store with one business, "Abadi AC".
///
/// The pool has a single connection, so transactions never overlap.
pub(crate) async fn fixture() -> Fixture {
    let services = Services::open(ServiceConfig::in_memory()).await.unwrap();
    let business = services.db().businesses().create("Abadi AC").await.unwrap();
    Fixture {
        services,
        business,
        _dir: None,
    }
}

/// Fresh WAL database file in a temp dir, pooled over `connections`
/// connections, with one business, "Abadi AC".
///
/// Concurrent writers here really contend for the SQLite write lock.
pub(crate) async fn file_fixture(connections: u32) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        database_path: dir.path().join("niaga.db"),
        max_connections: connections,
        ..ServiceConfig::default()
    };
    let services = Services::open(config).await.unwrap();
    let business = services.db().businesses().create("Abadi AC").await.unwrap();
    Fixture {
        services,
        business,
        _dir: Some(dir),
    }
}

/// Catalog input with no opening stock, sold at 10000.
pub(crate) fn new_item(business_id: &str, code: &str, name: &str) -> NewItem {
    NewItem {
        business_id: business_id.to_string(),
        code: code.to_string(),
        barcode: None,
        name: name.to_string(),
        stock: Quantity::zero(),
        unit: "pcs".to_string(),
        brand: None,
        warranty: None,
        cost_price: Money::zero(),
        selling_price: Money::from_units(10_000),
        currency: Some("IDR".to_string()),
    }
}

/// Creates an item with `stock` units at average cost `cost`, sold at
/// twice the cost.
pub(crate) async fn item_with_stock(
    f: &Fixture,
    code: &str,
    name: &str,
    stock: i64,
    cost: i64,
) -> Item {
    let mut input = new_item(&f.business.id, code, name);
    input.stock = Quantity::from_units(stock);
    input.cost_price = Money::from_units(cost);
    input.selling_price = Money::from_units(cost * 2);
    f.services.items().create(input).await.unwrap()
}

/// A cart with one line per `(item_id, quantity)`, every line at 10000.
pub(crate) fn sale_of<S: AsRef<str>>(business_id: &str, lines: &[(S, i64)]) -> NewSale {
    NewSale {
        business_id: business_id.to_string(),
        transaction_number: None,
        customer: None,
        note: None,
        lines: lines
            .iter()
            .map(|(item_id, qty)| NewSaleLine {
                item_id: item_id.as_ref().to_string(),
                quantity: Quantity::from_units(*qty),
                unit_price: Money::from_units(10_000),
                unit: "pcs".to_string(),
                discount_percent: None,
                note: None,
            })
            .collect(),
    }
}
