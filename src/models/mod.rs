//! Data models
//!
//! Entities stored by the backend and exchanged with the moderation client:
//! users, comments and the posts comments point at.

mod comment;
mod post;
mod user;

pub use comment::{
    Comment, CommentPage, CreateCommentInput, PostRef, SortOrder, COMMENT_PAGE_SIZE,
    MAX_COMMENT_LENGTH,
};
pub use post::Post;
pub use user::{DuplicateField, User};
