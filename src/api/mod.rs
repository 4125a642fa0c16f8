//! API layer - HTTP handlers and routing
//!
//! Everything is served under `/api`:
//! - `/api/auth/*` credential endpoints (public)
//! - `/api/comment/*` comment endpoints (session token required)
//! - `/api/health`

pub mod auth;
pub mod comments;
pub mod health;
pub mod middleware;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AuthConfig;
use crate::db::repositories::{SqlxCommentRepository, SqlxUserRepository};
use crate::db::DynDatabasePool;
use crate::services::comment::CommentService;
use crate::services::credentials::CredentialService;
use crate::services::identity::IdentityProvider;
use crate::services::token::TokenConfig;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Wire repositories and services over one pool
pub fn build_state(
    pool: DynDatabasePool,
    auth: &AuthConfig,
    identity: Option<&'static IdentityProvider>,
) -> AppState {
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let tokens = TokenConfig::from(auth);

    let credential_service =
        CredentialService::new(user_repo.clone(), tokens.clone()).with_bcrypt_cost(auth.bcrypt_cost);

    AppState {
        pool,
        user_repo,
        credential_service: Arc::new(credential_service),
        comment_service: Arc::new(CommentService::new(comment_repo)),
        tokens: Arc::new(tokens),
        identity,
    }
}

/// Build the `/api` routes
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .nest("/comment", comments::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth::router())
        .merge(protected_routes)
}

/// Build the complete router with CORS and request tracing.
///
/// `cors_origin` is a single origin, or `*` for any.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    let cors = if cors_origin == "*" {
        cors.allow_origin(Any)
    } else {
        let origin = cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
        cors.allow_origin(origin).allow_credentials(true)
    };

    Ok(Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
