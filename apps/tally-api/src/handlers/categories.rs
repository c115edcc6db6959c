use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tally_core::validation::validate_category_name;
use tally_core::Category;

use super::{body, created, ok, Envelope};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<Category>>>> {
    let categories = state.db.categories().list().await?;

    Ok(ok("Categories retrieved successfully", categories))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Category>>)> {
    let req = body(payload)?;
    let name = req.name.trim();
    validate_category_name(name)?;

    let category = state.db.categories().create(name).await?;

    Ok(created("Category created successfully", category))
}
