//! Sale processing against a real SQLite database.

use chrono::Utc;
use tally_core::store::NewSale;
use tally_core::{
    CartLine, Money, PaymentMethod, ProductInput, Role, SaleError, SaleProcessor, SaleRequest,
    SaleStatus, SaleStore, SaleTransaction, StoreError, UserInput,
};
use tally_db::{Database, DbConfig, SaleFilter};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

async fn file_db(dir: &TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("tally.db")).max_connections(4);
    Database::new(config).await.unwrap()
}

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn cashier(db: &Database) -> i64 {
    db.users()
        .create(&UserInput {
            username: "kasir".to_string(),
            email: "kasir@tally.local".to_string(),
            password_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
            role: Role::Cashier,
        })
        .await
        .unwrap()
        .id
}

async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> i64 {
    db.products()
        .create(&ProductInput {
            name: name.to_string(),
            description: None,
            price_cents,
            stock,
            category_id: None,
            barcode: None,
            is_active: true,
        })
        .await
        .unwrap()
        .id
}

async fn stock_of(db: &Database, product_id: i64) -> i64 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

async fn row_count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

fn cash(lines: &[(i64, i64)], tendered_cents: i64) -> SaleRequest {
    SaleRequest {
        lines: lines
            .iter()
            .map(|&(product_id, quantity)| CartLine { product_id, quantity })
            .collect(),
        payment_method: PaymentMethod::Cash,
        tendered: Money::from_cents(tendered_cents),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_sale_persists_and_reads_back() {
    let db = memory_db().await;
    let user_id = cashier(&db).await;
    let cola = product(&db, "Coca-Cola", 999, 10).await;
    let chips = product(&db, "Chips", 1250, 4).await;

    let processor = SaleProcessor::new(db.clone());
    let detail = processor
        .process_sale(user_id, cash(&[(cola, 2), (chips, 1)], 5000))
        .await
        .unwrap();

    assert_eq!(detail.sale.total_cents, 1998 + 1250);
    assert_eq!(detail.sale.change_cents, 5000 - 3248);
    assert_eq!(detail.sale.status, SaleStatus::Completed);
    assert_eq!(detail.sale.user_id, user_id);
    assert!(detail.sale.sale_number.starts_with("TRX-"));

    assert_eq!(stock_of(&db, cola).await, 8);
    assert_eq!(stock_of(&db, chips).await, 3);
    assert_eq!(row_count(&db, "sale_lines").await, 2);

    let stored = db.sales().get_detail(detail.sale.id).await.unwrap().unwrap();
    assert_eq!(stored, detail);
}

#[tokio::test]
async fn test_duplicate_lines_over_stock_leave_no_trace() {
    let db = memory_db().await;
    let user_id = cashier(&db).await;
    let cola = product(&db, "Coca-Cola", 999, 5).await;

    let processor = SaleProcessor::new(db.clone());
    let err = processor
        .process_sale(user_id, cash(&[(cola, 3), (cola, 3)], 10_000))
        .await
        .unwrap_err();

    match err {
        SaleError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(stock_of(&db, cola).await, 5);
    assert_eq!(row_count(&db, "sales").await, 0);
    assert_eq!(row_count(&db, "sale_lines").await, 0);
}

#[tokio::test]
async fn test_underpayment_restores_stock() {
    let db = memory_db().await;
    let user_id = cashier(&db).await;
    let cola = product(&db, "Coca-Cola", 999, 5).await;

    let processor = SaleProcessor::new(db.clone());
    let err = processor
        .process_sale(user_id, cash(&[(cola, 2)], 1000))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INSUFFICIENT_PAYMENT");
    assert_eq!(stock_of(&db, cola).await, 5);
    assert_eq!(row_count(&db, "sales").await, 0);
}

#[tokio::test]
async fn test_deleted_and_inactive_products_do_not_sell() {
    let db = memory_db().await;
    let user_id = cashier(&db).await;
    let gone = product(&db, "Discontinued", 100, 5).await;
    let paused = product(&db, "Seasonal", 100, 5).await;

    db.products().soft_delete(gone).await.unwrap();
    let mut input = ProductInput {
        name: "Seasonal".to_string(),
        description: None,
        price_cents: 100,
        stock: 5,
        category_id: None,
        barcode: None,
        is_active: false,
    };
    db.products().update(paused, &input).await.unwrap();

    let processor = SaleProcessor::new(db.clone());

    let err = processor.process_sale(user_id, cash(&[(gone, 1)], 500)).await.unwrap_err();
    assert!(matches!(err, SaleError::ProductNotFound { product_id } if product_id == gone));

    let err = processor.process_sale(user_id, cash(&[(paused, 1)], 500)).await.unwrap_err();
    assert!(matches!(err, SaleError::ProductInactive { .. }));

    input.is_active = true;
    db.products().update(paused, &input).await.unwrap();
    processor.process_sale(user_id, cash(&[(paused, 1)], 500)).await.unwrap();
    assert_eq!(stock_of(&db, paused).await, 4);
}

#[tokio::test]
async fn test_price_change_does_not_touch_history() {
    let db = memory_db().await;
    let user_id = cashier(&db).await;
    let cola = product(&db, "Coca-Cola", 999, 10).await;

    let processor = SaleProcessor::new(db.clone());
    let detail = processor
        .process_sale(user_id, cash(&[(cola, 1)], 1000))
        .await
        .unwrap();

    let input = ProductInput {
        name: "Coca-Cola".to_string(),
        description: None,
        price_cents: 1299,
        stock: 9,
        category_id: None,
        barcode: None,
        is_active: true,
    };
    db.products().update(cola, &input).await.unwrap();

    let stored = db.sales().get_detail(detail.sale.id).await.unwrap().unwrap();
    assert_eq!(stored.lines[0].line.unit_price_cents, 999);
    assert_eq!(stored.sale.total_cents, 999);
}

#[tokio::test]
async fn test_sale_number_unique_constraint_is_classified() {
    let db = memory_db().await;
    let user_id = cashier(&db).await;

    let new_sale = NewSale {
        user_id,
        sale_number: "TRX-20261016-1760572800-abcdef".to_string(),
        total_cents: 100,
        payment_method: PaymentMethod::Cash,
        payment_cents: 100,
        change_cents: 0,
        status: SaleStatus::Completed,
        created_at: Utc::now(),
    };

    let mut tx = db.begin().await.unwrap();
    tx.insert_sale(&new_sale).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let err = tx.insert_sale(&new_sale).await.unwrap_err();
    tx.rollback().await.unwrap();

    assert_eq!(
        err,
        StoreError::UniqueViolation {
            field: "sale_number".to_string()
        }
    );
    assert_eq!(row_count(&db, "sales").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_sales_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let user_id = cashier(&db).await;
    let last_one = product(&db, "Last One", 500, 1).await;

    let first = SaleProcessor::new(db.clone());
    let second = SaleProcessor::new(db.clone());

    let (a, b) = tokio::join!(
        first.process_sale(user_id, cash(&[(last_one, 1)], 500)),
        second.process_sale(user_id, cash(&[(last_one, 1)], 500)),
    );

    let outcomes = [a, b];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "outcomes: {outcomes:?}");

    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(
                matches!(err, SaleError::InsufficientStock { .. } | SaleError::Persistence(_)),
                "unexpected error: {err:?}"
            );
        }
    }

    assert_eq!(stock_of(&db, last_one).await, 0);
    assert_eq!(row_count(&db, "sales").await, 1);

    let page = db
        .sales()
        .list(&SaleFilter::default(), Default::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    db.close().await;
}
