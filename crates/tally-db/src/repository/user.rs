//! # User Repository
//!
//! Accounts for login and user administration.
//!
//! ## Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  username  UNIQUE among live users                                     │
//! │  email     UNIQUE among live users                                     │
//! │                                                                         │
//! │  A soft-deleted user frees both, and keeps its id so past sales still  │
//! │  reference it.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Page, PageRequest, User, UserInput};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND deleted_at IS NULL");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Finds a live user whose username or email equals `login`.
    pub async fn find_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE (username = ?1 OR email = ?1) AND deleted_at IS NULL"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(login.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self, page: PageRequest) -> DbResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
             ORDER BY id ASC LIMIT ?1 OFFSET ?2"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(users, page, total))
    }

    /// Inserts a user. `input.password_hash` is required.
    pub async fn create(&self, input: &UserInput) -> DbResult<User> {
        let password_hash = input
            .password_hash
            .as_deref()
            .ok_or_else(|| DbError::Internal("password hash is required".to_string()))?;

        debug!(username = %input.username, role = input.role.as_str(), "Creating user");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(password_hash)
        .bind(input.role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| with_identity(e, input))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Updates a live user. The password is replaced only when a new hash
    /// is given.
    pub async fn update(&self, id: i64, input: &UserInput) -> DbResult<User> {
        debug!(id, username = %input.username, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                username = ?1,
                email = ?2,
                role = ?3,
                password_hash = COALESCE(?4, password_hash),
                updated_at = ?5
            WHERE id = ?6 AND deleted_at IS NULL
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(input.role)
        .bind(&input.password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| with_identity(e, input))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting user");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE users SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Attaches the clashing username or email to a unique violation.
fn with_identity(err: sqlx::Error, input: &UserInput) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => {
            let value = if field == "email" {
                input.email.clone()
            } else {
                input.username.clone()
            };
            DbError::duplicate(field, value)
        }
        other => other,
    }
}
