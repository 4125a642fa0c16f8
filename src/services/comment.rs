//! Comment service
//!
//! Listing is for administrators only. A comment can be deleted by an
//! administrator or by its author.

use std::sync::Arc;

use chrono::{Duration, Months, Utc};
use uuid::Uuid;

use crate::db::repositories::CommentRepository;
use crate::models::{
    Comment, CommentPage, CreateCommentInput, SortOrder, COMMENT_PAGE_SIZE, MAX_COMMENT_LENGTH,
};
use crate::services::token::Claims;

/// Largest window a single listing may request
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Listing parameters, as taken from the query string
#[derive(Debug, Clone, Copy)]
pub struct ListParams {
    pub start_index: i64,
    pub limit: i64,
    pub order: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            start_index: 0,
            limit: COMMENT_PAGE_SIZE as i64,
            order: SortOrder::Desc,
        }
    }
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    /// One window of comments plus total and last-month counters
    pub async fn list(
        &self,
        claims: &Claims,
        params: ListParams,
    ) -> Result<CommentPage, CommentServiceError> {
        if !claims.is_admin() {
            return Err(CommentServiceError::Forbidden(
                "Keine Berechtigung, alle Kommentare anzuzeigen.".to_string(),
            ));
        }

        let limit = params.limit.clamp(0, MAX_LIST_LIMIT);
        let comments = self
            .repo
            .list(params.start_index.max(0), limit, params.order)
            .await?;
        let total_comments = self.repo.count().await?;

        let now = Utc::now();
        let one_month_ago = now
            .checked_sub_months(Months::new(1))
            .unwrap_or_else(|| now - Duration::days(30));
        let last_month_comments = self.repo.count_since(one_month_ago).await?;

        Ok(CommentPage {
            comments,
            total_comments,
            last_month_comments,
        })
    }

    /// Delete a comment as `claims`
    pub async fn delete(&self, claims: &Claims, id: &str) -> Result<(), CommentServiceError> {
        let comment = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound("Kommentar wurde nicht gefunden.".to_string()))?;

        if !claims.is_admin() && comment.user_id != claims.id {
            return Err(CommentServiceError::Forbidden(
                "Keine Berechtigung, diesen Kommentar zu löschen.".to_string(),
            ));
        }

        self.repo.delete(id).await?;
        tracing::info!(comment_id = %id, by = %claims.id, "Comment deleted");
        Ok(())
    }

    /// Create a comment authored by the token subject
    pub async fn create(
        &self,
        claims: &Claims,
        input: CreateCommentInput,
    ) -> Result<Comment, CommentServiceError> {
        let content = input.content.trim();
        if content.is_empty() || input.post_id.trim().is_empty() {
            return Err(CommentServiceError::Validation(
                "Bitte alle Felder ausfüllen.".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(CommentServiceError::Validation(format!(
                "Kommentar darf höchstens {} Zeichen lang sein.",
                MAX_COMMENT_LENGTH
            )));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            user_id: claims.id.clone(),
            post_id: None,
            number_of_likes: 0,
            created_at: now,
            updated_at: now,
        };

        Ok(self.repo.create(&comment, input.post_id.trim()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        PostRepository, SqlxCommentRepository, SqlxPostRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Post, User};

    struct Fixture {
        service: CommentService,
        author: Claims,
        stranger: Claims,
        admin: Claims,
        post: Post,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let mut claims = Vec::new();
        for (name, is_admin) in [("author", false), ("stranger", false), ("admin", true)] {
            let mut user = User::new(name.into(), format!("{}@example.com", name), "h".into());
            user.is_admin = is_admin;
            users.create(&user).await.unwrap();
            claims.push(Claims::for_session(&user));
        }

        let post = Post::new("beitrag", "Beitrag");
        SqlxPostRepository::new(pool.clone()).create(&post).await.unwrap();

        let mut claims = claims.into_iter();
        Fixture {
            service: CommentService::new(SqlxCommentRepository::boxed(pool)),
            author: claims.next().unwrap(),
            stranger: claims.next().unwrap(),
            admin: claims.next().unwrap(),
            post,
        }
    }

    fn input(content: &str, post_id: &str) -> CreateCommentInput {
        CreateCommentInput {
            content: content.to_string(),
            post_id: post_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_comment() {
        let f = setup().await;
        let comment = f
            .service
            .create(&f.author, input("  Toller Artikel!  ", &f.post.id))
            .await
            .unwrap();

        assert_eq!(comment.content, "Toller Artikel!");
        assert_eq!(comment.user_id, f.author.id);
        assert_eq!(comment.post_id.unwrap().slug, "beitrag");
    }

    #[tokio::test]
    async fn test_create_comment_validation() {
        let f = setup().await;

        let err = f.service.create(&f.author, input("   ", &f.post.id)).await.unwrap_err();
        assert!(matches!(err, CommentServiceError::Validation(_)));

        let too_long = "ä".repeat(MAX_COMMENT_LENGTH + 1);
        let err = f.service.create(&f.author, input(&too_long, &f.post.id)).await.unwrap_err();
        assert!(matches!(err, CommentServiceError::Validation(_)));

        let exact = "ä".repeat(MAX_COMMENT_LENGTH);
        assert!(f.service.create(&f.author, input(&exact, &f.post.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_requires_admin() {
        let f = setup().await;
        let err = f
            .service
            .list(&f.author, ListParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CommentServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_pages_and_counts() {
        let f = setup().await;
        for i in 0..11 {
            f.service
                .create(&f.author, input(&format!("Kommentar {}", i), &f.post.id))
                .await
                .unwrap();
        }

        let first = f.service.list(&f.admin, ListParams::default()).await.unwrap();
        assert_eq!(first.comments.len(), COMMENT_PAGE_SIZE);
        assert_eq!(first.total_comments, 11);
        assert_eq!(first.last_month_comments, 11);

        let second = f
            .service
            .list(
                &f.admin,
                ListParams {
                    start_index: COMMENT_PAGE_SIZE as i64,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(second.comments.len(), 2);

        let first_ids: Vec<_> = first.comments.iter().map(|c| &c.id).collect();
        assert!(second.comments.iter().all(|c| !first_ids.contains(&&c.id)));
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let f = setup().await;
        let mine = f
            .service
            .create(&f.author, input("eins", &f.post.id))
            .await
            .unwrap();
        let other = f
            .service
            .create(&f.author, input("zwei", &f.post.id))
            .await
            .unwrap();

        let err = f.service.delete(&f.stranger, &mine.id).await.unwrap_err();
        assert!(matches!(err, CommentServiceError::Forbidden(_)));

        f.service.delete(&f.author, &mine.id).await.unwrap();
        f.service.delete(&f.admin, &other.id).await.unwrap();

        let err = f.service.delete(&f.admin, &other.id).await.unwrap_err();
        assert!(matches!(err, CommentServiceError::NotFound(_)));
    }
}
