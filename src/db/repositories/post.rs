//! Post repository
//!
//! Posts are created by seeding and tests; there is no post API.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Post;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let query = "INSERT INTO posts (id, slug, title, created_at) VALUES (?, ?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(query)
                    .bind(&post.id)
                    .bind(&post.slug)
                    .bind(&post.title)
                    .bind(post.created_at)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .map(|_| ())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(query)
                    .bind(&post.id)
                    .bind(&post.slug)
                    .bind(&post.title)
                    .bind(post.created_at)
                    .execute(mysql(&self.pool)?)
                    .await
                    .map(|_| ())
            }
        }
        .with_context(|| format!("Failed to create post {}", post.slug))?;

        Ok(post.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_create_post() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxPostRepository::new(pool);

        let post = Post::new("hallo-welt", "Hallo Welt");
        let created = repo.create(&post).await.expect("Failed to create post");

        assert_eq!(created, post);
        repo.create(&Post::new("zweiter", "Zweiter"))
            .await
            .expect("A second slug is accepted");
    }

    #[tokio::test]
    async fn test_duplicate_slug_fails() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxPostRepository::new(pool);

        repo.create(&Post::new("same", "One")).await.unwrap();
        assert!(repo.create(&Post::new("same", "Two")).await.is_err());
    }
}
