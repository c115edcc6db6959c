//! Product catalog endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tally_core::validation::{
    validate_barcode, validate_price_cents, validate_product_name, validate_search_query,
    validate_stock,
};
use tally_core::{CoreError, Page, PageRequest, Product, ProductInput};
use tally_db::ProductFilter;
use tracing::info;

use super::{body, created, non_blank, ok, Envelope};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<i64>,
}

/// Create/update body. Prices are integer cents.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub category_id: Option<i64>,
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductRequest {
    fn into_input(self) -> ApiResult<ProductInput> {
        let name = self.name.trim().to_string();
        validate_product_name(&name)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)?;

        let barcode = non_blank(self.barcode);
        if let Some(barcode) = &barcode {
            validate_barcode(barcode)?;
        }

        Ok(ProductInput {
            name,
            description: non_blank(self.description),
            price_cents: self.price_cents,
            stock: self.stock,
            category_id: self.category_id,
            barcode,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Envelope<Page<Product>>>> {
    let search = match query.search.as_deref() {
        Some(s) => Some(validate_search_query(s)?).filter(|s| !s.is_empty()),
        None => None,
    };
    let filter = ProductFilter {
        search,
        category_id: query.category,
    };

    let page = state
        .db
        .products()
        .list(&filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(ok("Products retrieved successfully", page))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope<Product>>> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

    Ok(ok("Product retrieved successfully", product))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Product>>)> {
    let input = body(payload)?.into_input()?;

    let product = state.db.products().create(&input).await?;
    info!(product_id = product.id, name = %product.name, "Product created");

    Ok(created("Product created successfully", product))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<Product>>> {
    let input = body(payload)?.into_input()?;

    let product = state.db.products().update(id, &input).await?;

    Ok(ok("Product updated successfully", product))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope<()>>> {
    state.db.products().soft_delete(id).await?;
    info!(product_id = id, "Product deleted");

    Ok(ok("Product deleted successfully", ()))
}
