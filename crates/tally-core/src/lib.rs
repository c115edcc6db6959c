//! # tally-core: Business Logic for Tally POS
//!
//! This crate is the **heart** of Tally POS. It holds the domain types, the
//! money arithmetic and the sale transaction pipeline. It never touches a
//! database or the network directly: storage is reached through the traits
//! in [`store`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    /login, /products, /transactions, /dashboard, /users        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ processor │─►│ inventory │  │  pricing  │  │ assembler │  │   │
//! │  │   │ (atomic)  │  │  ledger   │  │ resolver  │  │  totals   │  │   │
//! │  │   └─────┬─────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │         │ SaleStore / SaleTransaction traits                    │   │
//! │  └─────────┼───────────────────────────────────────────────────────┘   │
//! │            │                                                            │
//! │  ┌─────────▼───────────────────────────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLine, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`store`] - Unit-of-work traits implemented by the database layer
//! - [`inventory`] - Stock validation and conditional decrement
//! - [`pricing`] - Authoritative unit price resolution
//! - [`assembler`] - Line subtotals, totals and change
//! - [`sale_number`] - Human-readable unique sale numbers
//! - [`processor`] - The atomic sale transaction processor
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(999); // $9.99
//! let subtotal = price.checked_multiply_quantity(2).unwrap();
//!
//! assert_eq!(subtotal.cents(), 1998);
//! assert_eq!(subtotal.to_string(), "$19.98");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod assembler;
pub mod error;
pub mod inventory;
pub mod money;
pub mod pricing;
pub mod processor;
pub mod sale_number;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, SaleError, StoreError, ValidationError};
pub use money::Money;
pub use processor::{CartLine, SaleProcessor, SaleRequest};
pub use sale_number::{Clock, SystemClock};
pub use store::{SaleStore, SaleTransaction};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a single unit of work short.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest catalog price in cents ($100,000,000.00).
///
/// A full cart at this price and quantity stays well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Products at or below this stock level count as "low stock" on the dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
