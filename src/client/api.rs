//! HTTP transport for the moderation client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::ClientError;
use crate::models::CommentPage;

/// The comment endpoints the moderation client needs
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// One page of comments starting at `start_index`
    async fn list_comments(&self, token: &str, start_index: usize)
        -> Result<CommentPage, ClientError>;

    async fn delete_comment(&self, token: &str, id: &str) -> Result<(), ClientError>;
}

/// The signed-in user as the client sees it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(flatten)]
    user: SessionUser,
    token: String,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// `CommentApi` over HTTP
#[derive(Clone)]
pub struct HttpCommentApi {
    client: Client,
    base_url: String,
}

impl HttpCommentApi {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Sign in and return the session user with its token
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionUser, String), ClientError> {
        let url = format!("{}/api/auth/signin", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SignInRequest { email, password })
            .send()
            .await?;

        let body: SignInResponse = check(response).await?.json().await?;
        Ok((body.user, body.token))
    }
}

/// Turn a non-success response into `ClientError::Server` with the
/// server's message
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unbekannter Fehler")
                .to_string()
        });

    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CommentApi for HttpCommentApi {
    async fn list_comments(
        &self,
        token: &str,
        start_index: usize,
    ) -> Result<CommentPage, ClientError> {
        let url = if start_index == 0 {
            format!("{}/api/comment/getcomments", self.base_url)
        } else {
            format!(
                "{}/api/comment/getcomments?startIndex={}",
                self.base_url, start_index
            )
        };

        let response = self.client.get(&url).bearer_auth(token).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete_comment(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/comment/delete-comment/{}", self.base_url, id);
        let response = self.client.delete(&url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpCommentApi::new("http://localhost:3000/");
        assert_eq!(api.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_session_user_from_signin_body() {
        let body: SignInResponse = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "username": "anna",
            "email": "anna@example.com",
            "isAdmin": true,
            "createdAt": "2026-01-01T00:00:00Z",
            "token": "jwt"
        }))
        .unwrap();

        assert_eq!(body.user.id, "u1");
        assert!(body.user.is_admin);
        assert_eq!(body.token, "jwt");
    }
}
