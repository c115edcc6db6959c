//! # Sale Repository
//!
//! Read side of recorded sales. Writes happen only through the sale unit of
//! work ([`crate::unit_of_work`]), so this repository has no insert or
//! update methods.
//!
//! ## Read Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleDetail                                                             │
//! │  ├── Sale            (sales row)                                       │
//! │  ├── cashier         (users row, soft-deleted included)                │
//! │  └── lines[]         (sale_lines JOIN products, in insertion order)    │
//! │       ├── SaleLine   unit_price_cents is the frozen snapshot           │
//! │       └── ProductSummary { id, name, barcode, category_id }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Soft-deleted products still resolve here: history must stay readable.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{
    Page, PageRequest, ProductSummary, Sale, SaleDetail, SaleLine, SaleLineDetail, SaleStatus,
    UserProfile,
};

pub(crate) const SALE_COLUMNS: &str = "id, user_id, sale_number, total_cents, payment_method, \
     payment_cents, change_cents, status, created_at";

pub(crate) const CASHIER_COLUMNS: &str = "id, username, email, role";

const LINE_SELECT: &str = r#"
    SELECT
        l.id, l.sale_id, l.product_id, l.quantity,
        l.unit_price_cents, l.subtotal_cents, l.created_at,
        p.name AS product_name, p.barcode AS product_barcode,
        p.category_id AS product_category_id
    FROM sale_lines l
    INNER JOIN products p ON p.id = l.product_id
"#;

/// Filters for [`SaleRepository::list`]. Dates are inclusive UTC days.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<SaleStatus>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleLineRow {
    id: i64,
    sale_id: i64,
    product_id: i64,
    quantity: i64,
    unit_price_cents: i64,
    subtotal_cents: i64,
    created_at: DateTime<Utc>,
    product_name: String,
    product_barcode: Option<String>,
    product_category_id: Option<i64>,
}

impl From<SaleLineRow> for SaleLineDetail {
    fn from(row: SaleLineRow) -> Self {
        SaleLineDetail {
            line: SaleLine {
                id: row.id,
                sale_id: row.sale_id,
                product_id: row.product_id,
                quantity: row.quantity,
                unit_price_cents: row.unit_price_cents,
                subtotal_cents: row.subtotal_cents,
                created_at: row.created_at,
            },
            product: ProductSummary {
                id: row.product_id,
                name: row.product_name,
                barcode: row.product_barcode,
                category_id: row.product_category_id,
            },
        }
    }
}

/// Repository for reading sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale with its lines and products.
    ///
    /// For a committed sale this equals what the sale processor returned.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let sql = format!("{LINE_SELECT} WHERE l.sale_id = ?1 ORDER BY l.id ASC");
        let lines = sqlx::query_as::<_, SaleLineRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(SaleLineDetail::from)
            .collect();

        let sql = format!("SELECT {CASHIER_COLUMNS} FROM users WHERE id = ?1");
        let cashier = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(sale.user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(Some(SaleDetail {
            sale,
            cashier,
            lines,
        }))
    }

    /// Lists sales newest first, each with its lines.
    pub async fn list(&self, filter: &SaleFilter, page: PageRequest) -> DbResult<Page<SaleDetail>> {
        debug!(?filter, page = page.page, limit = page.limit, "Listing sales");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sales");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut sales_query = QueryBuilder::<Sqlite>::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
        push_filters(&mut sales_query, filter);
        sales_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let sales = sales_query
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;

        let mut lines_by_sale = self.lines_for(&sales).await?;
        let cashiers = self.cashiers_for(&sales).await?;
        let items = sales
            .into_iter()
            .map(|sale| {
                let lines = lines_by_sale.remove(&sale.id).unwrap_or_default();
                let cashier = cashiers.get(&sale.user_id).cloned();
                SaleDetail {
                    sale,
                    cashier,
                    lines,
                }
            })
            .collect();

        Ok(Page::new(items, page, total))
    }

    async fn lines_for(&self, sales: &[Sale]) -> DbResult<HashMap<i64, Vec<SaleLineDetail>>> {
        let mut grouped: HashMap<i64, Vec<SaleLineDetail>> = HashMap::new();
        if sales.is_empty() {
            return Ok(grouped);
        }

        let mut query = QueryBuilder::<Sqlite>::new(LINE_SELECT);
        query.push(" WHERE l.sale_id IN (");
        let mut ids = query.separated(", ");
        for sale in sales {
            ids.push_bind(sale.id);
        }
        ids.push_unseparated(") ORDER BY l.id ASC");

        let rows = query
            .build_query_as::<SaleLineRow>()
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            grouped.entry(row.sale_id).or_default().push(row.into());
        }

        Ok(grouped)
    }

    async fn cashiers_for(&self, sales: &[Sale]) -> DbResult<HashMap<i64, UserProfile>> {
        if sales.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {CASHIER_COLUMNS} FROM users WHERE id IN ("));
        let mut ids = query.separated(", ");
        for sale in sales {
            ids.push_bind(sale.user_id);
        }
        ids.push_unseparated(")");

        let profiles = query
            .build_query_as::<UserProfile>()
            .fetch_all(&self.pool)
            .await?;

        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(start) = filter.start_date {
        query
            .push(" AND DATE(created_at) >= ")
            .push_bind(start.format("%Y-%m-%d").to_string());
    }

    if let Some(end) = filter.end_date {
        query
            .push(" AND DATE(created_at) <= ")
            .push_bind(end.format("%Y-%m-%d").to_string());
    }

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
