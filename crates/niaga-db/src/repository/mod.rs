//! # Repository Module
//!
//! Database repository implementations for Niaga.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  niaga-service                                                         │
//! │       │                                                                 │
//! │       │  db.items().search(&business_id, "freon")                      │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── search / get_in_business / insert / update_details   (pool)      │
//! │  └── fetch_in / write_position_in / delete_in             (tx conn)   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Pool methods run on their own connection. `_in` functions run on a    │
//! │  connection the caller owns, usually an open transaction.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`business::BusinessRepository`] - Tenants
//! - [`item::ItemRepository`] - Catalog, search, stock writes
//! - [`sale::SaleRepository`] - Sales and sale lines
//! - [`report::ReportRepository`] - Dashboard and receipt queries

pub mod business;
pub mod item;
pub mod report;
pub mod sale;
