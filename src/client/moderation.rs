//! Comment moderation controller
//!
//! Drives `ModerationState` from API results. Failures never escape: they
//! are logged and recorded in `last_error`, and nothing is retried.
//!
//! Every operation takes `&mut self`, so one controller never has two
//! requests in flight.

use std::sync::Arc;

use super::api::{CommentApi, SessionUser};
use super::state::{reduce, ModerationEvent, ModerationState};
use super::token_store::TokenStore;
use super::ClientError;

pub struct CommentModeration {
    api: Arc<dyn CommentApi>,
    tokens: Arc<dyn TokenStore>,
    user: SessionUser,
    state: ModerationState,
}

impl CommentModeration {
    pub fn new(api: Arc<dyn CommentApi>, tokens: Arc<dyn TokenStore>, user: SessionUser) -> Self {
        Self {
            api,
            tokens,
            user,
            state: ModerationState::default(),
        }
    }

    /// Seed the view, e.g. from a cached listing
    pub fn with_state(mut self, state: ModerationState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &ModerationState {
        &self.state
    }

    fn dispatch(&mut self, event: ModerationEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    fn token(&self) -> Result<String, ClientError> {
        self.tokens.load()?.ok_or(ClientError::MissingToken)
    }

    /// Load the first page. Does nothing for non-admin sessions.
    pub async fn fetch_initial_page(&mut self) {
        if !self.user.is_admin {
            return;
        }
        self.fetch(0, false).await;
    }

    /// Append the page after the comments already held
    pub async fn fetch_next_page(&mut self) {
        if !self.user.is_admin || !self.state.show_more {
            return;
        }
        let start_index = self.state.comments.len();
        self.fetch(start_index, true).await;
    }

    async fn fetch(&mut self, start_index: usize, append: bool) {
        let result = match self.token() {
            Ok(token) => self.api.list_comments(&token, start_index).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(page) => self.dispatch(ModerationEvent::PageFetched {
                comments: page.comments,
                append,
            }),
            Err(e) => {
                tracing::warn!(start_index, "Fetching comments failed: {}", e);
                self.dispatch(ModerationEvent::FetchFailed(e.to_string()));
            }
        }
    }

    /// Open the confirmation gate for `id`. No request is sent yet.
    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.dispatch(ModerationEvent::DeleteRequested(id.into()));
    }

    pub fn cancel_delete(&mut self) {
        self.dispatch(ModerationEvent::DeleteCancelled);
    }

    /// Send the delete for the comment behind the open gate
    pub async fn confirm_delete(&mut self) {
        let Some(id) = self.state.pending_delete.clone() else {
            return;
        };

        let result = match self.token() {
            Ok(token) => self.api.delete_comment(&token, &id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => self.dispatch(ModerationEvent::DeleteConfirmed(id)),
            Err(e) => {
                tracing::warn!(comment_id = %id, "Deleting comment failed: {}", e);
                self.dispatch(ModerationEvent::DeleteFailed(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::state::{comment, PAGE_SIZE};
    use crate::client::token_store::MemoryTokenStore;
    use crate::models::{Comment, CommentPage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List(usize),
        Delete(String),
    }

    /// Records calls and answers from scripted queues
    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<Call>>,
        pages: Mutex<VecDeque<Result<Vec<Comment>, ClientError>>>,
        deletes: Mutex<VecDeque<Result<(), ClientError>>>,
    }

    impl MockApi {
        fn with_pages(pages: Vec<Vec<Comment>>) -> Self {
            let api = Self::default();
            api.pages.lock().unwrap().extend(pages.into_iter().map(Ok));
            api
        }

        fn push_delete(&self, result: Result<(), ClientError>) {
            self.deletes.lock().unwrap().push_back(result);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommentApi for MockApi {
        async fn list_comments(
            &self,
            _token: &str,
            start_index: usize,
        ) -> Result<CommentPage, ClientError> {
            self.calls.lock().unwrap().push(Call::List(start_index));
            let comments = self.pages.lock().unwrap().pop_front().unwrap_or(Ok(vec![]))?;
            Ok(CommentPage {
                total_comments: comments.len() as i64,
                last_month_comments: 0,
                comments,
            })
        }

        async fn delete_comment(&self, _token: &str, id: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(Call::Delete(id.to_string()));
            self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn user(is_admin: bool) -> SessionUser {
        SessionUser {
            id: "u1".to_string(),
            username: "admin".to_string(),
            is_admin,
        }
    }

    fn page(prefix: &str, n: usize) -> Vec<Comment> {
        (0..n).map(|i| comment(&format!("{}{}", prefix, i))).collect()
    }

    fn controller(api: Arc<MockApi>, is_admin: bool) -> CommentModeration {
        CommentModeration::new(api, Arc::new(MemoryTokenStore::with_token("jwt")), user(is_admin))
    }

    fn ids(controller: &CommentModeration) -> Vec<String> {
        controller.state().comments.iter().map(|c| c.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_non_admin_makes_no_calls() {
        let api = Arc::new(MockApi::with_pages(vec![page("a", 3)]));
        let mut moderation = controller(api.clone(), false);

        moderation.fetch_initial_page().await;
        moderation.fetch_next_page().await;

        assert!(api.calls().is_empty());
        assert!(moderation.state().comments.is_empty());
    }

    #[tokio::test]
    async fn test_initial_then_next_page() {
        let api = Arc::new(MockApi::with_pages(vec![
            page("a", PAGE_SIZE),
            page("b", PAGE_SIZE - 1),
        ]));
        let mut moderation = controller(api.clone(), true);

        moderation.fetch_initial_page().await;
        assert!(moderation.state().show_more);

        moderation.fetch_next_page().await;
        assert_eq!(moderation.state().comments.len(), 2 * PAGE_SIZE - 1);
        assert!(!moderation.state().show_more);
        assert_eq!(api.calls(), vec![Call::List(0), Call::List(PAGE_SIZE)]);

        // Pagination is off now
        moderation.fetch_next_page().await;
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_token_is_surfaced() {
        let api = Arc::new(MockApi::with_pages(vec![page("a", 2)]));
        let mut moderation =
            CommentModeration::new(api.clone(), Arc::new(MemoryTokenStore::new()), user(true));

        moderation.fetch_initial_page().await;

        assert!(api.calls().is_empty());
        assert_eq!(
            moderation.state().last_error.as_deref(),
            Some(ClientError::MissingToken.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_state() {
        let api = Arc::new(MockApi::default());
        api.pages.lock().unwrap().push_back(Err(ClientError::Server {
            status: 403,
            message: "Keine Berechtigung".to_string(),
        }));
        let seeded = ModerationState {
            comments: vec![comment("x")],
            ..Default::default()
        };
        let mut moderation = controller(api, true).with_state(seeded);

        moderation.fetch_next_page().await;

        assert_eq!(ids(&moderation), vec!["x"]);
        assert!(moderation
            .state()
            .last_error
            .as_deref()
            .unwrap()
            .contains("Keine Berechtigung"));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let api = Arc::new(MockApi::default());
        let seeded = ModerationState {
            comments: vec![comment("a"), comment("b")],
            ..Default::default()
        };
        let mut moderation = controller(api.clone(), true).with_state(seeded);

        moderation.request_delete("a");
        assert!(api.calls().is_empty());

        moderation.cancel_delete();
        moderation.confirm_delete().await;
        assert!(api.calls().is_empty());
        assert_eq!(ids(&moderation), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_success_removes_comment() {
        let api = Arc::new(MockApi::default());
        api.push_delete(Ok(()));
        let seeded = ModerationState {
            comments: vec![comment("a"), comment("b")],
            ..Default::default()
        };
        let mut moderation = controller(api.clone(), true).with_state(seeded);

        moderation.request_delete("a");
        moderation.confirm_delete().await;

        assert_eq!(api.calls(), vec![Call::Delete("a".to_string())]);
        assert_eq!(ids(&moderation), vec!["b"]);
        assert!(moderation.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_comments() {
        let api = Arc::new(MockApi::default());
        api.push_delete(Err(ClientError::Server {
            status: 404,
            message: "Kommentar wurde nicht gefunden.".to_string(),
        }));
        let seeded = ModerationState {
            comments: vec![comment("a"), comment("b")],
            ..Default::default()
        };
        let mut moderation = controller(api, true).with_state(seeded);

        moderation.request_delete("a");
        moderation.confirm_delete().await;

        assert_eq!(ids(&moderation), vec!["a", "b"]);
        assert!(moderation
            .state()
            .last_error
            .as_deref()
            .unwrap()
            .contains("Kommentar wurde nicht gefunden."));
        assert!(moderation.state().pending_delete.is_none());
    }
}
