//! # Sale Unit of Work
//!
//! [`SaleStore`] / [`SaleTransaction`] over one SQLite transaction.
//!
//! ## Isolation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale A (stock 1)                    Sale B (stock 1)                   │
//! │  ───────────────                     ───────────────                    │
//! │  BEGIN                               BEGIN                              │
//! │  SELECT product  → stock 1           SELECT product  → stock 1          │
//! │  UPDATE .. stock >= 1 → 1 row        UPDATE ..  (waits for write lock)  │
//! │  INSERT sale, lines                        │                            │
//! │  COMMIT ─────────────────────────────────► │                            │
//! │                                      snapshot stale → "database is      │
//! │                                      locked" → Persistence, ROLLBACK    │
//! │                                                                         │
//! │  Either way stock never goes below zero: the UPDATE is conditional and  │
//! │  the column carries CHECK (stock >= 0).                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a [`SqliteSaleTx`] without committing rolls it back.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use tally_core::store::{NewSale, NewSaleLine, StoreResult};
use tally_core::{Product, Sale, SaleLine, SaleStore, SaleTransaction, StoreError, UserProfile};
use tracing::debug;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::sale::CASHIER_COLUMNS;

fn store_err(err: sqlx::Error) -> StoreError {
    DbError::from(err).into()
}

/// An open SQLite transaction used by the sale processor.
pub struct SqliteSaleTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl SaleStore for Database {
    type Tx = SqliteSaleTx;

    async fn begin(&self) -> StoreResult<SqliteSaleTx> {
        let tx = self.pool().begin().await.map_err(store_err)?;
        Ok(SqliteSaleTx { tx })
    }
}

#[async_trait]
impl SaleTransaction for SqliteSaleTx {
    async fn product_for_update(&mut self, product_id: i64) -> StoreResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_err)
    }

    async fn decrement_stock(&mut self, product_id: i64, quantity: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?1, updated_at = ?2
            WHERE id = ?3 AND deleted_at IS NULL AND stock >= ?1
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .execute(&mut *self.tx)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> StoreResult<Sale> {
        debug!(sale_number = %sale.sale_number, "Inserting sale");

        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                user_id, sale_number, total_cents, payment_method,
                payment_cents, change_cents, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(sale.user_id)
        .bind(&sale.sale_number)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.payment_cents)
        .bind(sale.change_cents)
        .bind(sale.status)
        .bind(sale.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(store_err)?;

        Ok(Sale {
            id: result.last_insert_rowid(),
            user_id: sale.user_id,
            sale_number: sale.sale_number.clone(),
            total_cents: sale.total_cents,
            payment_method: sale.payment_method,
            payment_cents: sale.payment_cents,
            change_cents: sale.change_cents,
            status: sale.status,
            created_at: sale.created_at,
        })
    }

    async fn insert_sale_lines(
        &mut self,
        sale: &Sale,
        lines: &[NewSaleLine],
    ) -> StoreResult<Vec<SaleLine>> {
        let mut inserted = Vec::with_capacity(lines.len());

        for line in lines {
            let result = sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, product_id, quantity,
                    unit_price_cents, subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(sale.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .bind(sale.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(store_err)?;

            inserted.push(SaleLine {
                id: result.last_insert_rowid(),
                sale_id: sale.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal_cents,
                created_at: sale.created_at,
            });
        }

        Ok(inserted)
    }

    async fn cashier(&mut self, user_id: i64) -> StoreResult<Option<UserProfile>> {
        let sql = format!("SELECT {CASHIER_COLUMNS} FROM users WHERE id = ?1");

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_err)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(store_err)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(store_err)
    }
}
