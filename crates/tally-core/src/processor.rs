//! # Sale Transaction Processor
//!
//! Records a sale as one all-or-nothing unit of work.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_sale(buyer_id, SaleRequest)                                    │
//! │       │                                                                 │
//! │       ├── validate_sale_request()        InvalidRequest (no tx yet)    │
//! │       │                                                                 │
//! │       ├── store.begin() ───────────────────────────────┐               │
//! │       │                                                │ unit of work  │
//! │       │   for line in request.lines (caller order):    │               │
//! │       │     inventory::reserve()   not found / inactive│/ stock        │
//! │       │     pricing::unit_price()                      │               │
//! │       │     assembler.push()                           │               │
//! │       │                                                │               │
//! │       │   assembler.settle(tendered)  InsufficientPayment              │
//! │       │   sale_number::generate(now)                   │               │
//! │       │   insert_sale()               DuplicateSaleNumber              │
//! │       │   insert_sale_lines()                          │               │
//! │       │                                                │               │
//! │       ├── Ok  → commit()                               │               │
//! │       └── Err → rollback(), return the original error ─┘               │
//! │                                                                         │
//! │  → SaleDetail (sale + lines + product summaries)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The processor holds no mutable state of its own. Concurrent calls are
//! isolated by the store's units of work.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::assembler::SaleAssembler;
use crate::error::{SaleError, SaleResult, StoreError};
use crate::inventory;
use crate::money::Money;
use crate::pricing;
use crate::sale_number::{self, Clock, SystemClock};
use crate::store::{NewSale, SaleStore, SaleTransaction};
use crate::types::{PaymentMethod, SaleDetail, SaleLineDetail, SaleStatus};
use crate::validation::{validate_cart_size, validate_payment_amount, validate_quantity};

// =============================================================================
// Request
// =============================================================================

/// One requested line: which product, how many. No price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Everything needed to record a sale, apart from who is recording it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    /// Lines in caller order. Repeated product ids are kept as separate lines.
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub tendered: Money,
}

/// Checks everything that can be checked without touching the store.
pub fn validate_sale_request(request: &SaleRequest) -> SaleResult<()> {
    validate_cart_size(request.lines.len())?;
    for line in &request.lines {
        validate_quantity(line.quantity)?;
    }
    validate_payment_amount(request.tendered.cents())?;
    Ok(())
}

// =============================================================================
// Processor
// =============================================================================

/// Runs sales against a [`SaleStore`], timestamped by a [`Clock`].
#[derive(Debug, Clone)]
pub struct SaleProcessor<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SaleStore> SaleProcessor<S, SystemClock> {
    pub fn new(store: S) -> Self {
        SaleProcessor {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: SaleStore, C: Clock> SaleProcessor<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        SaleProcessor { store, clock }
    }

    /// Records a sale for `buyer_id` (the authenticated cashier).
    ///
    /// On success every line's stock has been debited, the sale and its lines
    /// are committed, and the hydrated sale is returned. On any error nothing
    /// is left behind.
    pub async fn process_sale(&self, buyer_id: i64, request: SaleRequest) -> SaleResult<SaleDetail> {
        validate_sale_request(&request)?;

        let mut tx = self.store.begin().await?;

        match self.record(&mut tx, buyer_id, &request).await {
            Ok(detail) => {
                tx.commit().await?;
                info!(
                    sale_id = detail.sale.id,
                    sale_number = %detail.sale.sale_number,
                    user_id = buyer_id,
                    lines = detail.lines.len(),
                    total = %detail.sale.total(),
                    change = %detail.sale.change(),
                    "Sale recorded"
                );
                Ok(detail)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after sale error");
                }
                if err.is_persistence() {
                    warn!(user_id = buyer_id, error = %err, "Sale aborted");
                } else {
                    debug!(user_id = buyer_id, code = err.code(), error = %err, "Sale rejected");
                }
                Err(err)
            }
        }
    }

    async fn record(
        &self,
        tx: &mut S::Tx,
        buyer_id: i64,
        request: &SaleRequest,
    ) -> SaleResult<SaleDetail> {
        let mut assembler = SaleAssembler::with_capacity(request.lines.len());
        let mut products = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let product = inventory::reserve(tx, line.product_id, line.quantity).await?;
            assembler.push(product.id, line.quantity, pricing::unit_price(&product))?;
            products.push(product.summary());
        }

        let settlement = assembler.settle(request.tendered)?;

        let now = self.clock.now();
        let new_sale = NewSale {
            user_id: buyer_id,
            sale_number: sale_number::generate(now),
            total_cents: settlement.total.cents(),
            payment_method: request.payment_method,
            payment_cents: settlement.tendered.cents(),
            change_cents: settlement.change.cents(),
            status: SaleStatus::Completed,
            created_at: now,
        };

        let sale = tx.insert_sale(&new_sale).await.map_err(|err| match err {
            StoreError::UniqueViolation { .. } => {
                SaleError::DuplicateSaleNumber(new_sale.sale_number.clone())
            }
            other => SaleError::Persistence(other),
        })?;

        let lines = tx.insert_sale_lines(&sale, assembler.lines()).await?;
        let cashier = tx.cashier(buyer_id).await?;

        let lines = lines
            .into_iter()
            .zip(products)
            .map(|(line, product)| SaleLineDetail { line, product })
            .collect();

        Ok(SaleDetail {
            sale,
            cashier,
            lines,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale_number::FixedClock;
    use crate::store::memory::{cashier, product, FailPoint, MemoryStore};
    use chrono::{TimeZone, Utc};

    fn new_processor(store: MemoryStore) -> SaleProcessor<MemoryStore, FixedClock> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap());
        SaleProcessor::with_clock(store, clock)
    }

    fn cash(lines: Vec<(i64, i64)>, tendered_cents: i64) -> SaleRequest {
        SaleRequest {
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| CartLine {
                    product_id,
                    quantity,
                })
                .collect(),
            payment_method: PaymentMethod::Cash,
            tendered: Money::from_cents(tendered_cents),
        }
    }

    #[tokio::test]
    async fn test_happy_path_totals_change_and_stock() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10)])
            .with_cashier(cashier(7, "kasir1"));
        let processor = new_processor(store.clone());

        let detail = processor
            .process_sale(7, cash(vec![(1, 2)], 2500))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_cents, 1998);
        assert_eq!(detail.sale.payment_cents, 2500);
        assert_eq!(detail.sale.change_cents, 502);
        assert_eq!(detail.sale.user_id, 7);
        assert_eq!(detail.cashier.as_ref().map(|c| c.username.as_str()), Some("kasir1"));
        assert_eq!(detail.sale.status, SaleStatus::Completed);
        assert!(detail.sale.sale_number.starts_with("TRX-20261016-"));

        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].line.unit_price_cents, 999);
        assert_eq!(detail.lines[0].line.subtotal_cents, 1998);
        assert_eq!(detail.lines[0].product.name, "Coca-Cola");

        assert_eq!(store.stock(1), 8);
        let state = store.snapshot();
        assert_eq!(state.sales.len(), 1);
        assert_eq!(state.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_lines_fail_and_roll_back() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 5)]);
        let processor = new_processor(store.clone());

        let err = processor
            .process_sale(7, cash(vec![(1, 3), (1, 3)], 10_000))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SaleError::InsufficientStock {
                product_id: 1,
                available: 2,
                requested: 3,
                ..
            }
        ));
        assert_eq!(store.stock(1), 5);
        assert!(store.snapshot().sales.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_lines_within_stock_are_kept_separate() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 5)]);
        let processor = new_processor(store.clone());

        let detail = processor
            .process_sale(7, cash(vec![(1, 2), (1, 3)], 5000))
            .await
            .unwrap();

        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.sale.total_cents, 999 * 5);
        assert_eq!(store.stock(1), 0);
    }

    #[tokio::test]
    async fn test_insufficient_payment_leaves_stock() {
        let store = MemoryStore::with_products(vec![product(1, "Rice 5kg", 5000, 3)]);
        let processor = new_processor(store.clone());

        let err = processor
            .process_sale(7, cash(vec![(1, 1)], 4000))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INSUFFICIENT_PAYMENT");
        assert_eq!(store.stock(1), 3);
        assert!(store.snapshot().sales.is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_later_line_restores_earlier_lines() {
        let mut inactive = product(2, "Discontinued", 100, 10);
        inactive.is_active = false;
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10), inactive]);
        let processor = new_processor(store.clone());

        let err = processor
            .process_sale(7, cash(vec![(1, 4), (2, 1)], 10_000))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::ProductInactive { product_id: 2, .. }));
        assert_eq!(store.stock(1), 10);
    }

    #[tokio::test]
    async fn test_overflowing_amount_is_rejected_and_rolled_back() {
        let store = MemoryStore::with_products(vec![
            product(1, "Coca-Cola", 999, 10),
            product(2, "Mispriced", i64::MAX, 10),
        ]);
        let processor = new_processor(store.clone());

        let err = processor
            .process_sale(7, cash(vec![(1, 1), (2, 2)], i64::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::InvalidRequest(_)));
        assert!(!err.is_persistence());
        assert_eq!(store.stock(1), 10);
        assert_eq!(store.stock(2), 10);
        assert!(store.snapshot().sales.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10)]);
        let processor = new_processor(store.clone());

        let err = processor
            .process_sale(7, cash(vec![(1, 1), (42, 1)], 10_000))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::ProductNotFound { product_id: 42 }));
        assert_eq!(store.stock(1), 10);
    }

    #[tokio::test]
    async fn test_invalid_requests_never_open_a_tx() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10)]);
        let processor = new_processor(store.clone());

        let cases = vec![
            cash(vec![], 1000),
            cash(vec![(1, 0)], 1000),
            cash(vec![(1, -2)], 1000),
            cash(vec![(1, 1000)], 1_000_000),
            cash(vec![(1, 1)], 0),
            cash(vec![(1, 1); 101], 1_000_000),
        ];

        for request in cases {
            let err = processor.process_sale(7, request).await.unwrap_err();
            assert_eq!(err.code(), "INVALID_REQUEST");
        }
        assert_eq!(store.stock(1), 10);
    }

    #[tokio::test]
    async fn test_sale_number_collision() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10)])
            .failing_at(FailPoint::SaleNumberTaken);
        let processor = new_processor(store.clone());

        let err = processor
            .process_sale(7, cash(vec![(1, 1)], 1000))
            .await
            .unwrap_err();

        match err {
            SaleError::DuplicateSaleNumber(number) => assert!(number.starts_with("TRX-")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.stock(1), 10);
    }

    #[tokio::test]
    async fn test_persistence_failures_roll_back() {
        for point in [FailPoint::InsertLines, FailPoint::Commit] {
            let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10)])
                .failing_at(point);
            let processor = new_processor(store.clone());

            let err = processor
                .process_sale(7, cash(vec![(1, 2)], 2500))
                .await
                .unwrap_err();

            assert!(err.is_persistence(), "{point:?}: {err:?}");
            assert_eq!(store.stock(1), 10);
            assert!(store.snapshot().sales.is_empty());
        }
    }

    #[tokio::test]
    async fn test_price_change_after_sale_does_not_touch_snapshot() {
        let store = MemoryStore::with_products(vec![product(1, "Coca-Cola", 999, 10)]);
        let processor = new_processor(store.clone());

        processor
            .process_sale(7, cash(vec![(1, 1)], 1000))
            .await
            .unwrap();

        // A later repricing only affects later sales.
        let repriced = MemoryStore::with_products(vec![product(1, "Coca-Cola", 1299, 9)]);
        let later = new_processor(repriced)
            .process_sale(7, cash(vec![(1, 1)], 2000))
            .await
            .unwrap();

        assert_eq!(store.snapshot().lines[0].unit_price_cents, 999);
        assert_eq!(later.lines[0].line.unit_price_cents, 1299);
    }

    #[tokio::test]
    async fn test_stock_conservation_across_sales() {
        let store = MemoryStore::with_products(vec![
            product(1, "Coca-Cola", 999, 10),
            product(2, "Bread", 250, 4),
        ]);
        let processor = new_processor(store.clone());

        processor
            .process_sale(7, cash(vec![(1, 2), (2, 1)], 5000))
            .await
            .unwrap();
        processor
            .process_sale(7, cash(vec![(2, 10)], 5000))
            .await
            .unwrap_err();
        processor
            .process_sale(7, cash(vec![(1, 3), (2, 3)], 5000))
            .await
            .unwrap();

        let state = store.snapshot();
        let sold = |id: i64| -> i64 {
            state
                .lines
                .iter()
                .filter(|l| l.product_id == id)
                .map(|l| l.quantity)
                .sum()
        };
        assert_eq!(store.stock(1) + sold(1), 10);
        assert_eq!(store.stock(2) + sold(2), 4);

        for sale in &state.sales {
            let total: i64 = state
                .lines
                .iter()
                .filter(|l| l.sale_id == sale.id)
                .map(|l| l.subtotal_cents)
                .sum();
            assert_eq!(sale.total_cents, total);
            assert_eq!(sale.change_cents, sale.payment_cents - sale.total_cents);
        }
    }
}
