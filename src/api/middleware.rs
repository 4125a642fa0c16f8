//! API middleware
//!
//! Shared application state, the uniform error body, and the session token
//! gate for protected routes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Request, State,
    },
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::UserRepository;
use crate::db::DynDatabasePool;
use crate::services::comment::{CommentService, CommentServiceError};
use crate::services::credentials::{CredentialError, CredentialService};
use crate::services::identity::IdentityProvider;
use crate::services::token::{verify_token, Claims, TokenConfig};

/// Cookie checked when no `Authorization` header is present
pub const TOKEN_COOKIE: &str = "access_token";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_repo: Arc<dyn UserRepository>,
    pub credential_service: Arc<CredentialService>,
    pub comment_service: Arc<CommentService>,
    pub tokens: Arc<TokenConfig>,
    /// Google identity settings, set once at startup
    pub identity: Option<&'static IdentityProvider>,
}

/// Verified token claims of the caller
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub success: bool,
    pub status_code: u16,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: status.as_u16(),
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal Server Error",
        )
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Validation(m) => Self::validation_error(m),
            // Duplicates and wrong passwords are 400, not 409/401
            CredentialError::Conflict(m) => Self::new(StatusCode::BAD_REQUEST, "CONFLICT", m),
            CredentialError::InvalidCredentials(m) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS", m)
            }
            CredentialError::NotFound(m) => Self::not_found(m),
            CredentialError::Unexpected(e) => {
                tracing::error!("Credential operation failed: {:#}", e);
                Self::internal_error()
            }
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::Validation(m) => Self::validation_error(m),
            CommentServiceError::Forbidden(m) => Self::forbidden(m),
            CommentServiceError::NotFound(m) => Self::not_found(m),
            CommentServiceError::Internal(e) => {
                tracing::error!("Comment operation failed: {:#}", e);
                Self::internal_error()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

/// Extract the session token: `Authorization: Bearer` first, then the
/// `access_token` cookie.
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie
                    .strip_prefix(TOKEN_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
                {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
///
/// Verifies the session token and stores its claims as `AuthenticatedUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Nicht autorisiert"))?;

    let claims = verify_token(&state.tokens, &token).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::unauthorized("Nicht autorisiert")
    })?;

    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}
