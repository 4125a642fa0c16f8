//! Comment moderation client
//!
//! Talks to the comment endpoints on behalf of an administrator:
//! - `state` holds the view state and its reducer
//! - `api` is the HTTP transport
//! - `token_store` keeps the session token between runs
//! - `moderation` ties them together

pub mod api;
pub mod moderation;
pub mod state;
pub mod token_store;

use thiserror::Error;

pub use api::{CommentApi, HttpCommentApi, SessionUser};
pub use moderation::CommentModeration;
pub use state::{reduce, ModerationEvent, ModerationState, PAGE_SIZE};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[derive(Debug, Error)]
pub enum ClientError {
    /// No session token stored locally
    #[error("Auth-Token nicht gefunden")]
    MissingToken,

    /// Non-success response; `message` is the server's
    #[error("{message} ({status})")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token store error: {0}")]
    TokenStore(#[source] std::io::Error),
}
