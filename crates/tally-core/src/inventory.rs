//! # Inventory Ledger
//!
//! Checks and debits stock for one cart line inside an open unit of work.
//!
//! ## Reserve Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve(tx, product_id, quantity)                                      │
//! │       │                                                                 │
//! │       ├── product_for_update()  → None?        ProductNotFound         │
//! │       ├── !is_active?                          ProductInactive         │
//! │       ├── stock < quantity?                    InsufficientStock       │
//! │       │                                                                 │
//! │       ├── decrement_stock()     → no row hit?  InsufficientStock       │
//! │       │   UPDATE .. SET stock = stock - q WHERE id = ? AND stock >= q  │
//! │       │                                                                 │
//! │       └── Ok(product as loaded)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is written immediately, so a later line of the same cart
//! naming the same product sees the reduced stock.

use tracing::debug;

use crate::error::SaleError;
use crate::store::SaleTransaction;
use crate::types::Product;

/// Validates and debits `quantity` units of `product_id`.
///
/// Returns the product as it was loaded, before the decrement, so callers
/// price the line from the same row they validated against.
pub async fn reserve<T>(tx: &mut T, product_id: i64, quantity: i64) -> Result<Product, SaleError>
where
    T: SaleTransaction,
{
    let product = tx
        .product_for_update(product_id)
        .await?
        .ok_or(SaleError::ProductNotFound { product_id })?;

    if !product.is_active {
        return Err(SaleError::ProductInactive {
            product_id,
            name: product.name,
        });
    }

    if !product.has_stock_for(quantity) {
        return Err(SaleError::InsufficientStock {
            product_id,
            name: product.name,
            available: product.stock,
            requested: quantity,
        });
    }

    if !tx.decrement_stock(product_id, quantity).await? {
        // Another writer took the stock between our read and our write.
        return Err(SaleError::InsufficientStock {
            product_id,
            name: product.name,
            available: product.stock,
            requested: quantity,
        });
    }

    debug!(
        product_id,
        quantity,
        remaining = product.stock - quantity,
        "Stock reserved"
    );

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================
