use axum::{extract::State, Json};
use chrono::Utc;
use tally_core::Dashboard;

use super::{ok, Envelope};
use crate::error::ApiResult;
use crate::AppState;

pub async fn get(State(state): State<AppState>) -> ApiResult<Json<Envelope<Dashboard>>> {
    let dashboard = state.db.dashboard().load(Utc::now()).await?;

    Ok(ok("Dashboard data retrieved successfully", dashboard))
}
