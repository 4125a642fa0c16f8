//! Moderation view state
//!
//! A plain struct changed only through `reduce`. Whatever drives the view
//! (a UI, a TUI, a test) feeds it `ModerationEvent`s.

use crate::models::{Comment, COMMENT_PAGE_SIZE};

/// Comments per page requested by the dashboard
pub const PAGE_SIZE: usize = COMMENT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq)]
pub struct ModerationState {
    /// Comments in server order, pages appended as fetched
    pub comments: Vec<Comment>,
    /// Whether another page may exist
    pub show_more: bool,
    /// Comment awaiting delete confirmation
    pub pending_delete: Option<String>,
    /// Last failure, cleared by the next success
    pub last_error: Option<String>,
}

impl Default for ModerationState {
    fn default() -> Self {
        Self {
            comments: Vec::new(),
            show_more: true,
            pending_delete: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModerationEvent {
    /// A page arrived; `append` is false for the initial page
    PageFetched { comments: Vec<Comment>, append: bool },
    /// Confirmation gate opened for a comment
    DeleteRequested(String),
    /// Confirmation gate dismissed
    DeleteCancelled,
    /// The server deleted the comment
    DeleteConfirmed(String),
    /// The server refused the delete
    DeleteFailed(String),
    /// Listing failed
    FetchFailed(String),
}

pub fn reduce(mut state: ModerationState, event: ModerationEvent) -> ModerationState {
    match event {
        ModerationEvent::PageFetched { comments, append } => {
            let full_page = comments.len() >= PAGE_SIZE;
            if append {
                state.comments.extend(comments);
                state.show_more = state.show_more && full_page;
            } else {
                state.comments = comments;
                state.show_more = full_page;
            }
            state.last_error = None;
        }
        ModerationEvent::DeleteRequested(id) => {
            state.pending_delete = Some(id);
        }
        ModerationEvent::DeleteCancelled => {
            state.pending_delete = None;
        }
        ModerationEvent::DeleteConfirmed(id) => {
            state.comments.retain(|c| c.id != id);
            state.pending_delete = None;
            state.last_error = None;
        }
        ModerationEvent::DeleteFailed(message) => {
            state.pending_delete = None;
            state.last_error = Some(message);
        }
        ModerationEvent::FetchFailed(message) => {
            state.last_error = Some(message);
        }
    }
    state
}

#[cfg(test)]
pub(crate) fn comment(id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        content: format!("Kommentar {}", id),
        user_id: "u".to_string(),
        post_id: None,
        number_of_likes: 0,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}
