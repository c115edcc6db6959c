//! # Repository Module
//!
//! Database repositories for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.products().list(&filter, page)                        │
//! │       ▼                                                                 │
//! │  ProductRepository / CategoryRepository / UserRepository               │
//! │  SaleRepository (read side) / DashboardRepository                      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  Sale WRITES do not go through a repository: they run inside the       │
//! │  sale unit of work (crate::unit_of_work) driven by SaleProcessor.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search and paging
//! - [`category::CategoryRepository`] - Product categories
//! - [`user::UserRepository`] - Accounts and login lookup
//! - [`sale::SaleRepository`] - Sale read-back and history
//! - [`dashboard::DashboardRepository`] - Sales aggregates

pub mod category;
pub mod dashboard;
pub mod product;
pub mod sale;
pub mod user;
