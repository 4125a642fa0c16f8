//! Comment repository
//!
//! Listings join the parent post so each comment carries its slug and title.
//! A comment whose post is gone is still listed, with `post_id` set to `None`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Comment, PostRef, SortOrder};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment; `post_id` is the bare parent post id
    async fn create(&self, comment: &Comment, post_id: &str) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Comment>>;

    /// Window of comments ordered by creation time
    async fn list(&self, start_index: i64, limit: i64, order: SortOrder) -> Result<Vec<Comment>>;

    /// Count all comments
    async fn count(&self) -> Result<i64>;

    /// Count comments created at or after `since`
    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64>;

    /// Delete a comment. Returns false when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment, post_id: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(sqlite(&self.pool)?, comment, post_id).await?,
            DatabaseDriver::Mysql => create_mysql(mysql(&self.pool)?, comment, post_id).await?,
        }

        self.get_by_id(&comment.id)
            .await?
            .with_context(|| format!("Comment {} vanished after insert", comment.id))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Comment>> {
        let query = format!("{} WHERE c.id = ?", SELECT_COMMENTS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&query)
                .bind(id)
                .fetch_optional(sqlite(&self.pool)?)
                .await
                .context("Failed to get comment by ID")?
                .map(|row| row_to_comment_sqlite(&row))
                .transpose(),
            DatabaseDriver::Mysql => sqlx::query(&query)
                .bind(id)
                .fetch_optional(mysql(&self.pool)?)
                .await
                .context("Failed to get comment by ID")?
                .map(|row| row_to_comment_mysql(&row))
                .transpose(),
        }
    }

    async fn list(&self, start_index: i64, limit: i64, order: SortOrder) -> Result<Vec<Comment>> {
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let query = format!(
            "{} ORDER BY c.created_at {dir}, c.id {dir} LIMIT ? OFFSET ?",
            SELECT_COMMENTS,
            dir = direction
        );
        let start_index = start_index.max(0);
        let limit = limit.max(0);

        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&query)
                .bind(limit)
                .bind(start_index)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to list comments")?
                .iter()
                .map(row_to_comment_sqlite)
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&query)
                .bind(limit)
                .bind(start_index)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to list comments")?
                .iter()
                .map(row_to_comment_mysql)
                .collect(),
        }
    }

    async fn count(&self) -> Result<i64> {
        let query = "SELECT COUNT(*) AS count FROM comments";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(query)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count comments")?
                .try_get("count")?,
            DatabaseDriver::Mysql => sqlx::query(query)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count comments")?
                .try_get("count")?,
        };
        Ok(count)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let query = "SELECT COUNT(*) AS count FROM comments WHERE created_at >= ?";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(query)
                .bind(since)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count recent comments")?
                .try_get("count")?,
            DatabaseDriver::Mysql => sqlx::query(query)
                .bind(since)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count recent comments")?
                .try_get("count")?,
        };
        Ok(count)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let query = "DELETE FROM comments WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(query)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(query)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

const SELECT_COMMENTS: &str = r#"
    SELECT c.id, c.content, c.user_id, c.post_id, c.number_of_likes,
           c.created_at, c.updated_at, p.slug AS post_slug, p.title AS post_title
    FROM comments c
    LEFT JOIN posts p ON p.id = c.post_id
"#;

const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (id, content, post_id, user_id, number_of_likes, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

fn post_ref(post_id: String, slug: Option<String>, title: Option<String>) -> Option<PostRef> {
    match (slug, title) {
        (Some(slug), Some(title)) => Some(PostRef {
            id: post_id,
            slug,
            title,
        }),
        _ => None,
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, comment: &Comment, post_id: &str) -> Result<()> {
    sqlx::query(INSERT_COMMENT)
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(post_id)
        .bind(&comment.user_id)
        .bind(comment.number_of_likes)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(pool)
        .await
        .context("Failed to create comment")?;
    Ok(())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        post_id: post_ref(
            row.try_get("post_id")?,
            row.try_get("post_slug")?,
            row.try_get("post_title")?,
        ),
        number_of_likes: row.try_get("number_of_likes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, comment: &Comment, post_id: &str) -> Result<()> {
    sqlx::query(INSERT_COMMENT)
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(post_id)
        .bind(&comment.user_id)
        .bind(comment.number_of_likes)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(pool)
        .await
        .context("Failed to create comment")?;
    Ok(())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Comment> {
    let likes: i32 = row.try_get("number_of_likes")?;
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        post_id: post_ref(
            row.try_get("post_id")?,
            row.try_get("post_slug")?,
            row.try_get("post_title")?,
        ),
        number_of_likes: i64::from(likes),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
