//! # Sale Assembler
//!
//! Pure accumulation of priced lines into a sale total, then settlement
//! against the tendered amount.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  push(product 1, qty 2, $9.99)   subtotal  $19.98   total  $19.98       │
//! │  push(product 7, qty 1, $2.50)   subtotal   $2.50   total  $22.48       │
//! │                                                                         │
//! │  settle(tendered $25.00)                                                │
//! │       ├── tendered < total → InsufficientPayment                       │
//! │       └── change = $25.00 − $22.48 = $2.52                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is integer cents, so `total == Σ subtotal` exactly.

use crate::error::{SaleError, ValidationError};
use crate::money::Money;
use crate::store::NewSaleLine;

/// Running state of a sale being assembled.
#[derive(Debug, Clone, Default)]
pub struct SaleAssembler {
    lines: Vec<NewSaleLine>,
    total: Money,
}

/// Final amounts of a settled sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub total: Money,
    pub tendered: Money,
    pub change: Money,
}

impl SaleAssembler {
    pub fn with_capacity(lines: usize) -> Self {
        SaleAssembler {
            lines: Vec::with_capacity(lines),
            total: Money::zero(),
        }
    }

    /// Appends a line priced at `unit_price` and returns its subtotal.
    ///
    /// A subtotal or running total that would not fit in `i64` cents
    /// rejects the request; nothing is appended in that case.
    pub fn push(
        &mut self,
        product_id: i64,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Money, SaleError> {
        let subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| amount_too_large("subtotal"))?;
        let total = self
            .total
            .checked_add(subtotal)
            .ok_or_else(|| amount_too_large("total"))?;

        self.lines.push(NewSaleLine {
            product_id,
            quantity,
            unit_price_cents: unit_price.cents(),
            subtotal_cents: subtotal.cents(),
        });
        self.total = total;
        Ok(subtotal)
    }

    pub fn lines(&self) -> &[NewSaleLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Checks `tendered` against the total and computes the change.
    pub fn settle(&self, tendered: Money) -> Result<Settlement, SaleError> {
        let change = tendered
            .checked_change(self.total)
            .ok_or(SaleError::InsufficientPayment {
                total: self.total,
                tendered,
            })?;

        Ok(Settlement {
            total: self.total,
            tendered,
            change,
        })
    }
}

fn amount_too_large(field: &str) -> SaleError {
    SaleError::InvalidRequest(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_change() {
        let mut assembler = SaleAssembler::default();
        let subtotal = assembler.push(1, 2, Money::from_cents(999)).unwrap();
        assert_eq!(subtotal.cents(), 1998);

        let settled = assembler.settle(Money::from_cents(2500)).unwrap();
        assert_eq!(settled.total.cents(), 1998);
        assert_eq!(settled.change.cents(), 502);
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let mut assembler = SaleAssembler::with_capacity(3);
        assembler.push(1, 3, Money::from_cents(333)).unwrap();
        assembler.push(2, 1, Money::from_cents(1)).unwrap();
        assembler.push(1, 7, Money::from_cents(10)).unwrap();

        let sum: i64 = assembler.lines().iter().map(|l| l.subtotal_cents).sum();
        assert_eq!(assembler.total().cents(), sum);
        assert_eq!(sum, 999 + 1 + 70);
    }

    #[test]
    fn test_duplicate_products_are_not_collapsed() {
        let mut assembler = SaleAssembler::default();
        assembler.push(5, 1, Money::from_cents(100)).unwrap();
        assembler.push(5, 2, Money::from_cents(100)).unwrap();

        let lines = assembler.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[1].quantity, 2);
    }

    #[test]
    fn test_insufficient_payment() {
        let mut assembler = SaleAssembler::default();
        assembler.push(1, 1, Money::from_cents(5000)).unwrap();

        match assembler.settle(Money::from_cents(4000)) {
            Err(SaleError::InsufficientPayment { total, tendered }) => {
                assert_eq!(total.cents(), 5000);
                assert_eq!(tendered.cents(), 4000);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_exact_payment_gives_zero_change() {
        let mut assembler = SaleAssembler::default();
        assembler.push(1, 1, Money::from_cents(5000)).unwrap();

        let settled = assembler.settle(Money::from_cents(5000)).unwrap();
        assert!(settled.change.is_zero());
    }

    #[test]
    fn test_overflowing_line_is_rejected() {
        let mut assembler = SaleAssembler::default();
        let err = assembler
            .push(1, 2, Money::from_cents(i64::MAX))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert!(assembler.lines().is_empty());
        assert!(assembler.total().is_zero());
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let mut assembler = SaleAssembler::default();
        assembler.push(1, 1, Money::from_cents(i64::MAX)).unwrap();

        let err = assembler.push(2, 1, Money::from_cents(1)).unwrap_err();
        assert!(matches!(err, SaleError::InvalidRequest(_)));
        assert_eq!(assembler.lines().len(), 1);
        assert_eq!(assembler.total().cents(), i64::MAX);
    }
}
