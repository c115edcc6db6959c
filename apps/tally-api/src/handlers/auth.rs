//! Login and self-registration.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tally_core::UserProfile;
use tracing::{info, warn};

use super::users::{parse_role, user_input};
use super::{body, created, ok, Envelope};
use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Login request. `username` accepts a username or an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserProfile,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<LoginResponse>>> {
    let req = body(payload)?;
    let login = req.username.trim();

    if login.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }

    let user = state.db.users().find_by_login(login).await?;

    let user = match user {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            warn!(login = %login, "Failed login attempt");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    let token = state.jwt.issue(&user)?;
    info!(user_id = user.id, role = user.role.as_str(), "User logged in");

    Ok(ok(
        "Login successful",
        LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: state.jwt.lifetime_secs(),
            user: user.profile(),
        },
    ))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<UserProfile>>)> {
    let req = body(payload)?;
    let role = parse_role(req.role.as_deref())?;
    let input = user_input(&req.username, &req.email, Some(&req.password), role)?;

    let user = state.db.users().create(&input).await?;
    info!(user_id = user.id, role = role.as_str(), "User registered");

    Ok(created("User registered successfully", user.profile()))
}
