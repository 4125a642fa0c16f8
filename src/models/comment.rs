//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of comments per moderation page
pub const COMMENT_PAGE_SIZE: usize = 9;

/// Longest comment body accepted on creation
pub const MAX_COMMENT_LENGTH: usize = 200;

/// The parent post as shown next to a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub title: String,
}

/// Comment entity
///
/// `post_id` is `None` when the parent post no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub post_id: Option<PostRef>,
    #[serde(default)]
    pub number_of_likes: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub content: String,
    pub post_id: String,
}

/// Sort direction for comment listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A window of the comment list plus the counters the dashboard shows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub total_comments: i64,
    #[serde(default)]
    pub last_month_comments: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_wire_format() {
        let comment = Comment {
            id: "c1".into(),
            content: "Schöner Beitrag".into(),
            user_id: "u1".into(),
            post_id: Some(PostRef {
                id: "p1".into(),
                slug: "hallo-welt".into(),
                title: "Hallo Welt".into(),
            }),
            number_of_likes: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["_id"], "c1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["postId"]["slug"], "hallo-welt");
        assert_eq!(json["numberOfLikes"], 3);
        assert!(json["updatedAt"].is_string());
    }

    #[test]
    fn test_minimal_comment_deserializes() {
        let comment: Comment = serde_json::from_str(r#"{"_id":"a"}"#).unwrap();
        assert_eq!(comment.id, "a");
        assert!(comment.post_id.is_none());
        assert_eq!(comment.number_of_likes, 0);
    }

    #[test]
    fn test_sort_order_default_is_desc() {
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        let asc: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(asc, SortOrder::Asc);
    }
}
