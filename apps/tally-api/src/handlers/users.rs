//! User administration (admin only).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tally_core::validation::{validate_email, validate_password, validate_username};
use tally_core::{Page, Role, User, UserInput, UserProfile, ValidationError};
use tracing::info;

use super::{body, created, ok, Envelope, PageQuery};
use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    /// Kept unchanged when absent or blank.
    pub password: Option<String>,
    pub role: String,
}

/// Parses a role name; `None` means cashier.
pub(crate) fn parse_role(role: Option<&str>) -> ApiResult<Role> {
    let Some(role) = role.filter(|r| !r.trim().is_empty()) else {
        return Ok(Role::Cashier);
    };

    Role::parse(role).ok_or_else(|| {
        ValidationError::NotAllowed {
            field: "role".to_string(),
            allowed: vec!["admin".to_string(), "cashier".to_string()],
        }
        .into()
    })
}

/// Validates account fields and hashes the password if one is given.
pub(crate) fn user_input(
    username: &str,
    email: &str,
    password: Option<&str>,
    role: Role,
) -> ApiResult<UserInput> {
    let username = username.trim();
    let email = email.trim();

    validate_username(username)?;
    validate_email(email)?;

    let password_hash = match password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    Ok(UserInput {
        username: username.to_string(),
        email: email.to_lowercase(),
        password_hash,
        role,
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Envelope<Page<UserProfile>>>> {
    let page = state.db.users().list(query.request()).await?;

    Ok(ok("Users retrieved successfully", page.map(|u| u.profile())))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<UserProfile>>)> {
    let req = body(payload)?;
    let role = parse_role(req.role.as_deref())?;
    let input = user_input(&req.username, &req.email, Some(&req.password), role)?;

    let user = state.db.users().create(&input).await?;
    info!(admin_id = admin.user_id, user_id = user.id, role = role.as_str(), "User created");

    Ok(created("User created successfully", user.profile()))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<UserProfile>>> {
    let req = body(payload)?;
    let role = parse_role(Some(&req.role))?;
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    let input = user_input(&req.username, &req.email, password, role)?;

    let user: User = state.db.users().update(id, &input).await?;

    Ok(ok("User updated successfully", user.profile()))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope<()>>> {
    if id == admin.user_id {
        return Err(ApiError::validation("Cannot delete your own account"));
    }

    state.db.users().soft_delete(id).await?;
    info!(admin_id = admin.user_id, user_id = id, "User deleted");

    Ok(ok("User deleted successfully", ()))
}
