//! # niaga-db: Database Layer for Niaga
//!
//! This crate provides database access for Niaga.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Niaga Data Flow                                │
//! │                                                                         │
//! │  niaga-service (SaleRecorder::record)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     niaga-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BusinessRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ItemRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ SaleRepo      │    │              │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (niaga.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`codec`] - TEXT encoding of decimals and timestamps
//! - [`repository`] - Repository implementations (business, item, sale, report)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use niaga_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./niaga.db")).await?;
//!
//! let items = db.items().search(&business_id, "freon").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::business::BusinessRepository;
pub use repository::item::ItemRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
