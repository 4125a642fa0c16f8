//! Authentication API endpoints
//!
//! - POST /api/auth/signup - Register, 201 with the user and a token
//! - POST /api/auth/signin - Email and password sign-in
//! - POST /api/auth/google - Sign in or provision from a Google account

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::services::credentials::{GoogleInput, SigninInput, SignupInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/google", post(google))
}

/// POST /api/auth/signup
async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let outcome = state.credential_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/auth/signin
async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let outcome = state.credential_service.sign_in(input).await?;
    Ok(Json(outcome))
}

/// POST /api/auth/google
async fn google(
    State(state): State<AppState>,
    payload: Result<Json<GoogleInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    if state.identity.is_none() {
        tracing::warn!("Google login before identity provider initialization");
    }
    let outcome = state.credential_service.google_auth(input).await?;
    Ok(Json(outcome))
}
