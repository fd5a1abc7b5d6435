//! # Seed Data Generator
//!
//! Populates the database with two demo businesses for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./niaga_dev.db with the full demo catalog
//! cargo run -p niaga-service --bin seed
//!
//! # Only the first 3 items of each catalog
//! cargo run -p niaga-service --bin seed -- --items 3
//!
//! # Specify database path
//! cargo run -p niaga-service --bin seed -- --db ./data/niaga.db
//! ```
//!
//! ## Generated Data
//! - "Abadi AC" (air-conditioner parts) and "Moza Variasi" (car accessories)
//! - Every item starts empty and receives two restocks at different purchase
//!   prices, so its `hargaPokok` is a real weighted average
//! - One sample sale per business
//!
//! Running it again on a seeded database changes nothing.

use std::env;

use niaga_core::{
    Business, DiscountPercent, Money, NewItem, NewSale, NewSaleLine, Quantity, Restock,
};
use niaga_db::codec;
use niaga_service::{init_tracing, ServiceConfig, Services};

const ABADI_AC_ID: &str = "3711db27-6726-0000-0000-608d67bf750c";
const MOZA_VARIASI_ID: &str = "12a3cc6e-ce65-0000-0000-d5ddf30f1b0c";

/// (kode, nama, satuan, merek, garansi, harga jual, first lot, second lot)
type CatalogEntry = (
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    Option<&'static str>,
    i64,
    (i64, i64),
    (i64, i64),
);

const ABADI_AC_CATALOG: &[CatalogEntry] = &[
    ("AC-FR32", "Freon R32 1kg", "kg", Some("Klea"), None, 185_000, (10, 140_000), (5, 152_000)),
    ("AC-FR22", "Freon R22 1kg", "kg", Some("Dupont"), None, 165_000, (8, 120_000), (4, 126_000)),
    ("AC-PIPA14", "Pipa Tembaga 1/4", "meter", Some("Hoda"), None, 45_000, (50, 30_000), (25, 33_000)),
    ("AC-KAP35", "Kapasitor 35uF", "pcs", None, Some("1 bulan"), 55_000, (12, 32_000), (6, 35_000)),
    ("AC-BRK", "Bracket Outdoor", "set", None, None, 75_000, (6, 48_000), (6, 50_000)),
    ("AC-REMOTE", "Remote AC Universal", "pcs", Some("Chunghop"), Some("1 minggu"), 35_000, (20, 18_000), (10, 19_500)),
    ("AC-INV1", "AC Split Inverter 1 PK", "unit", Some("Daikin"), Some("1 tahun"), 5_250_000, (2, 4_600_000), (1, 4_750_000)),
];

const MOZA_VARIASI_CATALOG: &[CatalogEntry] = &[
    ("MV-LED-H4", "Lampu LED H4", "set", Some("Philips"), Some("6 bulan"), 350_000, (10, 250_000), (5, 265_000)),
    ("MV-KARPET", "Karpet Mobil Universal", "set", None, None, 225_000, (8, 150_000), (4, 160_000)),
    ("MV-SPION", "Spion Tambahan", "pcs", None, None, 40_000, (20, 22_000), (10, 24_000)),
    ("MV-KLAKSON", "Klakson Keong", "set", Some("Hella"), Some("3 bulan"), 185_000, (6, 130_000), (6, 136_000)),
    ("MV-COVER", "Cover Jok Kulit", "set", None, None, 1_150_000, (3, 800_000), (2, 840_000)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut item_limit = usize::MAX;
    let mut db_path = String::from("./niaga_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--items" | "-n" => {
                if i + 1 < args.len() {
                    item_limit = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Niaga Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --items <N>    Items per business (default: whole catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./niaga_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    println!("Niaga Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let config = ServiceConfig {
        database_path: db_path.into(),
        ..ServiceConfig::load()?
    };
    let services = Services::open(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if services.db().businesses().exists(ABADI_AC_ID).await? {
        println!("⚠ Demo businesses already exist");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        services.close().await;
        return Ok(());
    }

    let start = std::time::Instant::now();

    let seeds = [
        (ABADI_AC_ID, "Abadi AC", ABADI_AC_CATALOG, Some("Budi Santoso")),
        (MOZA_VARIASI_ID, "Moza Variasi", MOZA_VARIASI_CATALOG, None),
    ];

    for (business_id, name, catalog, customer) in seeds {
        let business = Business {
            id: business_id.to_string(),
            name: name.to_string(),
            created_at: codec::now(),
        };
        services.db().businesses().insert(&business).await?;
        println!();
        println!("✓ Business {}", name);

        let mut created = Vec::new();
        for entry in catalog.iter().take(item_limit) {
            let item_id = seed_item(&services, business_id, entry).await?;
            created.push(item_id);
        }
        println!("  {} items restocked", created.len());

        if created.is_empty() {
            continue;
        }

        let sale = sample_sale(business_id, customer, &created, catalog);
        let detail = services.sales().record(sale).await?;
        println!(
            "  Sample sale {} ({} lines, total {})",
            detail.sale.transaction_number,
            detail.items.len(),
            detail.sale.grand_total
        );
    }

    println!();
    println!("✓ Seeded in {:?}", start.elapsed());

    services.close().await;
    Ok(())
}

/// Creates an empty item and restocks it with both lots.
async fn seed_item(
    services: &Services,
    business_id: &str,
    entry: &CatalogEntry,
) -> Result<String, Box<dyn std::error::Error>> {
    let (code, name, unit, brand, warranty, price, first_lot, second_lot) = *entry;

    let item = services
        .items()
        .create(NewItem {
            business_id: business_id.to_string(),
            code: code.to_string(),
            barcode: None,
            name: name.to_string(),
            stock: Quantity::zero(),
            unit: unit.to_string(),
            brand: brand.map(str::to_string),
            warranty: warranty.map(str::to_string),
            cost_price: Money::zero(),
            selling_price: Money::from_units(price),
            currency: None,
        })
        .await?;

    for (qty, purchase_price) in [first_lot, second_lot] {
        services
            .restocks()
            .restock(
                &item.id,
                Restock {
                    qty: Quantity::from_units(qty),
                    purchase_price: Money::from_units(purchase_price),
                    selling_price: None,
                },
            )
            .await?;
    }

    Ok(item.id)
}

/// One unit of each of the first two items, the second at 5% off.
fn sample_sale(
    business_id: &str,
    customer: Option<&str>,
    item_ids: &[String],
    catalog: &[CatalogEntry],
) -> NewSale {
    let lines = item_ids
        .iter()
        .zip(catalog)
        .take(2)
        .enumerate()
        .map(|(index, (item_id, entry))| NewSaleLine {
            item_id: item_id.clone(),
            quantity: Quantity::from_units(1),
            unit_price: Money::from_units(entry.5),
            unit: entry.2.to_string(),
            discount_percent: (index == 1).then(|| DiscountPercent::from_units(5)),
            note: None,
        })
        .collect();

    NewSale {
        business_id: business_id.to_string(),
        transaction_number: None,
        customer: customer.map(str::to_string),
        note: None,
        lines,
    }
}
