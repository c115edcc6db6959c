//! # tally-db: Database Layer for Tally POS
//!
//! SQLite storage for Tally POS, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /transactions)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleProcessor<Database>  (tally-core)                                 │
//! │       │ SaleStore::begin                                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  product      │    │  (embedded)  │  │   │
//! │  │   │               │    │  category     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  user         │    │ 001_initial_ │  │   │
//! │  │   │ SaleStore     │    │  sale (read)  │    │   schema.sql │  │   │
//! │  │   │ impl          │    │  dashboard    │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼───────┐                                            │   │
//! │  │   │ SqliteSaleTx  │  one BEGIN..COMMIT per sale               │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`unit_of_work`] - The sale transaction the processor runs in
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::SaleProcessor;
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("data/tally.db")).await?;
//!
//! let page = db.products().list(&ProductFilter::default(), PageRequest::default()).await?;
//!
//! let processor = SaleProcessor::new(db.clone());
//! let sale = processor.process_sale(user_id, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::SqliteSaleTx;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::user::UserRepository;
