//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! Creation reports unique-key collisions as `CreateUserError::Duplicate`
//! so callers can tell "username taken" from "email taken".

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{DuplicateField, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;
use thiserror::Error;

/// Failure of `UserRepository::create`
#[derive(Debug, Error)]
pub enum CreateUserError {
    /// A unique column already holds this value
    #[error("duplicate {0}")]
    Duplicate(DuplicateField),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    async fn create(&self, user: &User) -> std::result::Result<User, CreateUserError>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Grant or revoke the administrator flag. Returns false for unknown ids.
    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> std::result::Result<User, CreateUserError> {
        let result = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql(&self.pool)?, user).await,
        };

        match result {
            Ok(()) => Ok(user.clone()),
            Err(e) => Err(classify_insert_error(e)),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_sqlite(sqlite(&self.pool)?, "email", email).await,
            DatabaseDriver::Mysql => get_user_mysql(mysql(&self.pool)?, "email", email).await,
        }
    }

    async fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool> {
        let query = "UPDATE users SET is_admin = ?, updated_at = ? WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(query)
                .bind(is_admin)
                .bind(Utc::now())
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to update admin flag")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(query)
                .bind(is_admin)
                .bind(Utc::now())
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to update admin flag")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

/// Turn a failed insert into a typed duplicate or a generic failure
fn classify_insert_error(err: sqlx::Error) -> CreateUserError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return CreateUserError::Duplicate(collided_field(db_err.message()));
        }
    }
    CreateUserError::Other(anyhow::Error::new(err).context("Failed to create user"))
}

/// Find which unique column a driver message refers to.
///
/// SQLite: `UNIQUE constraint failed: users.email`
/// MySQL: `Duplicate entry 'x' for key 'users.email'`
///
/// The MySQL message embeds the offending value, so only the key part is
/// inspected.
fn collided_field(message: &str) -> DuplicateField {
    let key = message
        .rsplit_once("for key")
        .map(|(_, key)| key)
        .or_else(|| message.rsplit_once("failed:").map(|(_, key)| key))
        .unwrap_or(message);

    if key.contains("email") {
        DuplicateField::Email
    } else {
        DuplicateField::Username
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_admin, profile_picture, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_admin, profile_picture, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_admin)
    .bind(&user.profile_picture)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

async fn get_user_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE {} = ?",
        USER_COLUMNS, column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
        profile_picture: row.try_get("profile_picture")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_admin, profile_picture, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_admin)
    .bind(&user.profile_picture)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

async fn get_user_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE {} = ?",
        USER_COLUMNS, column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
        profile_picture: row.try_get("profile_picture")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
