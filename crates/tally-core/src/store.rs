//! # Store Seam
//!
//! Unit-of-work traits the sale processor runs against.
//!
//! ## Shape of a Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleStore::begin() ──► SaleTransaction                                 │
//! │                           │                                             │
//! │                           ├── product_for_update(id)   read inside tx  │
//! │                           ├── decrement_stock(id, q)   conditional     │
//! │                           ├── insert_sale(new)                         │
//! │                           ├── insert_sale_lines(sale, lines)           │
//! │                           ├── cashier(user_id)         profile read    │
//! │                           │                                             │
//! │                           ├── commit()    all writes become visible    │
//! │                           └── rollback()  none of them ever did        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `tally-db` implements these over a SQLite transaction. Tests in this crate
//! use an in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::{PaymentMethod, Product, Sale, SaleLine, SaleStatus, UserProfile};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Write Models
// =============================================================================

/// A sale row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub user_id: i64,
    pub sale_number: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_cents: i64,
    pub change_cents: i64,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

/// A sale line about to be inserted. Prices are already frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Traits
// =============================================================================

/// Something that can open a unit of work.
#[async_trait]
pub trait SaleStore: Send + Sync {
    type Tx: SaleTransaction;

    /// Opens a new unit of work. Nothing written through it is visible to
    /// anyone else until [`SaleTransaction::commit`].
    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// One open unit of work.
///
/// Dropping a transaction without committing must discard its writes.
#[async_trait]
pub trait SaleTransaction: Send {
    /// Loads a live (not soft-deleted) product as seen by this unit of work,
    /// including decrements made earlier in it.
    async fn product_for_update(&mut self, product_id: i64) -> StoreResult<Option<Product>>;

    /// `stock = stock - quantity` only when `stock >= quantity`.
    ///
    /// Returns `false` when no row was changed.
    async fn decrement_stock(&mut self, product_id: i64, quantity: i64) -> StoreResult<bool>;

    /// Inserts the sale header. A taken `sale_number` is reported as
    /// [`StoreError::UniqueViolation`].
    async fn insert_sale(&mut self, sale: &NewSale) -> StoreResult<Sale>;

    /// Inserts lines for `sale`, in order, returning them with their ids.
    async fn insert_sale_lines(
        &mut self,
        sale: &Sale,
        lines: &[NewSaleLine],
    ) -> StoreResult<Vec<SaleLine>>;

    /// Profile of the recording user, soft-deleted users included.
    async fn cashier(&mut self, user_id: i64) -> StoreResult<Option<UserProfile>>;

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}

// =============================================================================
// In-Memory Store (tests)
// =============================================================================
