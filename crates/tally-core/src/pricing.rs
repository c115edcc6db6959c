//! # Pricing Resolver
//!
//! The unit price of a sale line always comes from the product row loaded
//! inside the unit of work. A cart line carries only a product id and a
//! quantity, so there is no client price to trust or reject.
//!
//! ```text
//! CartLine { product_id, quantity }
//!          │
//!          ▼
//! product_for_update(product_id) ──► Product { price_cents: 999, .. }
//!          │
//!          ▼
//! unit_price(&product) = $9.99   ──► frozen into SaleLine.unit_price_cents
//! ```

use crate::money::Money;
use crate::types::Product;

/// Authoritative unit price for `product` at the moment of sale.
#[inline]
pub fn unit_price(product: &Product) -> Money {
    product.price()
}
