//! Sale endpoints. `POST /transactions` is the only way a sale is recorded.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tally_core::validation::validate_date;
use tally_core::{
    CartLine, CoreError, Money, Page, PageRequest, PaymentMethod, SaleDetail, SaleRequest,
    SaleStatus, ValidationError,
};
use tally_db::SaleFilter;

use super::{body, created, non_blank, ok, Envelope};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// Body of `POST /transactions`. No prices: they come from the catalog.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub items: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub payment_cents: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

impl TransactionQuery {
    fn filter(&self) -> ApiResult<SaleFilter> {
        let start_date = non_blank(self.start_date.clone())
            .map(|d| validate_date("start_date", &d))
            .transpose()?;
        let end_date = non_blank(self.end_date.clone())
            .map(|d| validate_date("end_date", &d))
            .transpose()?;

        let status = match non_blank(self.status.clone()) {
            Some(s) => Some(SaleStatus::parse(&s).ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "pending".to_string(),
                    "completed".to_string(),
                    "cancelled".to_string(),
                ],
            })?),
            None => None,
        };

        Ok(SaleFilter {
            start_date,
            end_date,
            status,
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<SaleDetail>>)> {
    let req = body(payload)?;

    let request = SaleRequest {
        lines: req.items,
        payment_method: req.payment_method,
        tendered: Money::from_cents(req.payment_cents),
    };

    let detail = state.processor.process_sale(claims.user_id, request).await?;

    Ok(created("Transaction created successfully", detail))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Envelope<Page<SaleDetail>>>> {
    let filter = query.filter()?;

    let page = state
        .db
        .sales()
        .list(&filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(ok("Transactions retrieved successfully", page))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope<SaleDetail>>> {
    let detail = state
        .db
        .sales()
        .get_detail(id)
        .await?
        .ok_or(CoreError::SaleNotFound(id))?;

    Ok(ok("Transaction retrieved successfully", detail))
}
