//! # Dashboard Repository
//!
//! Aggregates over completed sales for the back-office dashboard.
//!
//! ## Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  now = 2026-10-16T14:00Z                                                │
//! │                                                                         │
//! │  today          DATE(created_at) = '2026-10-16'                         │
//! │  month-to-date  DATE(created_at) >= '2026-10-01'                        │
//! │  revenue chart  '2026-10-10' ..= '2026-10-16', missing days → 0         │
//! │                                                                         │
//! │  Only status = 'completed' sales count toward revenue and totals.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Days are UTC calendar days.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::sale::SALE_COLUMNS;
use tally_core::{
    Dashboard, DashboardStats, RevenuePoint, Sale, SaleStatus, TopProduct, LOW_STOCK_THRESHOLD,
};

/// Days shown on the revenue chart, today included.
pub const REVENUE_DAYS: i64 = 7;

/// Rows in the top products and recent sales lists.
pub const DASHBOARD_LIST_LIMIT: i64 = 5;

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Repository for dashboard aggregates.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Loads the full dashboard as of `now`.
    pub async fn load(&self, now: DateTime<Utc>) -> DbResult<Dashboard> {
        let today = now.date_naive();
        let month_start = today.with_day(1).unwrap_or(today);

        debug!(today = %today, "Loading dashboard");

        Ok(Dashboard {
            stats: self.stats(today, month_start).await?,
            top_products: self.top_products(month_start).await?,
            revenue_data: self.revenue_by_day(today).await?,
            recent_transactions: self.recent_sales().await?,
        })
    }

    async fn stats(&self, today: NaiveDate, month_start: NaiveDate) -> DbResult<DashboardStats> {
        let total_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        let total_transactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE status = ?1")
            .bind(SaleStatus::Completed)
            .fetch_one(&self.pool)
            .await?;

        let (today_transactions, today_revenue_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = ?1 AND DATE(created_at) = ?2
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(day_key(today))
        .fetch_one(&self.pool)
        .await?;

        let monthly_revenue_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = ?1 AND DATE(created_at) >= ?2
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(day_key(month_start))
        .fetch_one(&self.pool)
        .await?;

        let low_stock_products: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE deleted_at IS NULL AND is_active = 1 AND stock <= ?1
            "#,
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_products,
            total_transactions,
            today_transactions,
            today_revenue_cents,
            monthly_revenue_cents,
            low_stock_products,
        })
    }

    /// Best sellers by quantity since `since`.
    async fn top_products(&self, since: NaiveDate) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.name AS product_name,
                SUM(l.quantity) AS total_sold,
                SUM(l.subtotal_cents) AS revenue_cents
            FROM sale_lines l
            INNER JOIN sales s ON s.id = l.sale_id
            INNER JOIN products p ON p.id = l.product_id
            WHERE s.status = ?1 AND DATE(s.created_at) >= ?2
            GROUP BY l.product_id, p.name
            ORDER BY total_sold DESC, revenue_cents DESC
            LIMIT ?3
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(day_key(since))
        .bind(DASHBOARD_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// One point per day, oldest first, ending today.
    async fn revenue_by_day(&self, today: NaiveDate) -> DbResult<Vec<RevenuePoint>> {
        let first_day = today - Duration::days(REVENUE_DAYS - 1);

        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT DATE(created_at) AS day, COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = ?1 AND DATE(created_at) BETWEEN ?2 AND ?3
            GROUP BY day
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(day_key(first_day))
        .bind(day_key(today))
        .fetch_all(&self.pool)
        .await?;

        let by_day: HashMap<String, i64> = rows.into_iter().collect();

        Ok((0..REVENUE_DAYS)
            .map(|offset| {
                let date = day_key(first_day + Duration::days(offset));
                let revenue_cents = by_day.get(&date).copied().unwrap_or(0);
                RevenuePoint { date, revenue_cents }
            })
            .collect())
    }

    async fn recent_sales(&self) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE status = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(SaleStatus::Completed)
            .bind(DASHBOARD_LIST_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
