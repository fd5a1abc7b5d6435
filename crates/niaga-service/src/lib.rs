//! # niaga-service: Orchestration Layer for Niaga
//!
//! The entry point for outer layers. Owns the database handle and hands out
//! the services that use it.
//!
//! ## Module Organization
//! ```text
//! niaga_service/
//! ├── lib.rs          ◄─── You are here (Services, tracing setup)
//! ├── config.rs       ◄─── ServiceConfig from NIAGA_* variables
//! ├── error.rs        ◄─── ApiError returned by every operation
//! ├── sales.rs        ◄─── SaleRecorder (atomic sale + stock decrement)
//! ├── restock.rs      ◄─── CostAverager (weighted-average restock)
//! ├── items.rs        ◄─── ItemService (catalog)
//! ├── reports.rs      ◄─── ReportService (inventory, dashboard, receipt)
//! └── retry.rs        ◄─── Bounded retry of write transactions
//! ```
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  init_tracing()                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Services::open(ServiceConfig::load()?)                                 │
//! │       │   • connect pool (WAL, foreign keys, busy timeout)              │
//! │       │   • run embedded migrations                                     │
//! │       ▼                                                                 │
//! │  services.sales().record(..) / services.items().search(..) / ...        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  services.close()                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every service holds a clone of the same [`Database`]; cloning only bumps
//! the pool's reference count.

pub mod config;
pub mod error;
pub mod items;
pub mod reports;
pub mod restock;
pub mod sales;

mod retry;

#[cfg(test)]
mod testing;

use tracing::info;
use tracing_subscriber::EnvFilter;

use niaga_db::Database;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ErrorCode};
pub use items::ItemService;
pub use reports::ReportService;
pub use restock::CostAverager;
pub use sales::SaleRecorder;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,niaga=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// All services over one database.
#[derive(Debug, Clone)]
pub struct Services {
    db: Database,
    config: ServiceConfig,
    sales: SaleRecorder,
    restocks: CostAverager,
    items: ItemService,
    reports: ReportService,
}

impl Services {
    /// Opens the database, runs migrations and builds every service.
    pub async fn open(config: ServiceConfig) -> Result<Self, ApiError> {
        let db = Database::new(config.db_config()).await?;

        info!(
            path = %config.database_path.display(),
            max_write_attempts = config.max_write_attempts,
            "Services ready"
        );

        Ok(Services::with_database(db, config))
    }

    /// Builds the services over an already opened database.
    pub fn with_database(db: Database, config: ServiceConfig) -> Self {
        Services {
            sales: SaleRecorder::new(db.clone(), config.clone()),
            restocks: CostAverager::new(db.clone(), config.clone()),
            items: ItemService::new(db.clone(), config.clone()),
            reports: ReportService::new(db.clone(), config.clone()),
            db,
            config,
        }
    }

    pub fn sales(&self) -> &SaleRecorder {
        &self.sales
    }

    pub fn restocks(&self) -> &CostAverager {
        &self.restocks
    }

    pub fn items(&self) -> &ItemService {
        &self.items
    }

    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    /// The underlying database, for tenant setup and tooling.
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.db.close().await;
        info!("Services closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let services = Services::open(ServiceConfig::in_memory()).await.unwrap();
        assert!(services.db().health_check().await);

        let business = services.db().businesses().create("Abadi AC").await.unwrap();
        let items = services
            .items()
            .search(&business.id, None, niaga_core::Role::Owner)
            .await
            .unwrap();
        assert!(items.full().unwrap().is_empty());

        services.close().await;
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
