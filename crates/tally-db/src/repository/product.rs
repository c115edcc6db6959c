//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Paged listing with name/barcode search and category filter
//! - CRUD with soft delete
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /products?search=cola&category=2&page=1&limit=10                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE deleted_at IS NULL                                               │
//! │    AND (name LIKE '%cola%' OR barcode LIKE '%cola%')                    │
//! │    AND category_id = 2                                                  │
//! │       │                                                                 │
//! │       ├── COUNT(*)                       → Page.total                   │
//! │       └── ORDER BY name LIMIT 10 OFFSET 0 → Page.items                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is only decremented by the sale unit of work; here it is set
//! directly by catalog updates.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Page, PageRequest, Product, ProductInput};

/// Column list matching [`Product`]'s `FromRow` fields.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock, \
     category_id, barcode, is_active, created_at, updated_at";

/// Filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring of name or barcode.
    pub search: Option<String>,
    pub category_id: Option<i64>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let page = repo.list(&ProductFilter::default(), PageRequest::default()).await?;
/// let product = repo.get_by_id(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a live (not soft-deleted) product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND deleted_at IS NULL"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists live products, one page at a time.
    pub async fn list(&self, filter: &ProductFilter, page: PageRequest) -> DbResult<Page<Product>> {
        debug!(?filter, page = page.page, limit = page.limit, "Listing products");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut items_query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut items_query, filter);
        items_query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = items_query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, total))
    }

    /// Inserts a product and returns the stored row.
    ///
    /// ## Errors
    /// - `NotFound` if `category_id` names no live category
    /// - `UniqueViolation` if the barcode is taken by a live product
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        self.ensure_category(input.category_id).await?;

        debug!(name = %input.name, "Creating product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, price_cents, stock, category_id,
                barcode, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(input.category_id)
        .bind(&input.barcode)
        .bind(input.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, input))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces a live product's fields.
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        self.ensure_category(input.category_id).await?;

        debug!(id, name = %input.name, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                name = ?1,
                description = ?2,
                price_cents = ?3,
                stock = ?4,
                category_id = ?5,
                barcode = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?9 AND deleted_at IS NULL
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(input.category_id)
        .bind(&input.barcode)
        .bind(input.is_active)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, input))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product.
    ///
    /// Past sale lines keep pointing at the row; it just stops resolving for
    /// new sales and catalog reads.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting product");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts live products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn ensure_category(&self, category_id: Option<i64>) -> DbResult<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1 AND deleted_at IS NULL)",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(DbError::not_found("Category", category_id))
        }
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    query.push(" WHERE deleted_at IS NULL");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        query
            .push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR barcode LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category_id) = filter.category_id {
        query.push(" AND category_id = ").push_bind(category_id);
    }
}

/// Attaches the offending barcode to a unique violation.
fn with_barcode(err: sqlx::Error, input: &ProductInput) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => {
            DbError::duplicate(field, input.barcode.clone().unwrap_or_default())
        }
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
