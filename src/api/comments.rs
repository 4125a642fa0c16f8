//! Comment API endpoints
//!
//! - GET /api/comment/getcomments - Admin listing, `startIndex`, `limit`, `sort`
//! - DELETE /api/comment/delete-comment/{id} - Admin or author
//! - POST /api/comment/create - Any signed-in user
//!
//! All routes sit behind `require_auth`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateCommentInput, SortOrder};
use crate::services::comment::ListParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getcomments", get(get_comments))
        .route("/delete-comment/{id}", delete(delete_comment))
        .route("/create", post(create_comment))
}

/// Query parameters for the listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub start_index: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<SortOrder>,
}

impl From<ListQuery> for ListParams {
    fn from(query: ListQuery) -> Self {
        let defaults = ListParams::default();
        Self {
            start_index: query.start_index.unwrap_or(defaults.start_index),
            limit: query.limit.unwrap_or(defaults.limit),
            order: query.sort.unwrap_or(defaults.order),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/comment/getcomments
async fn get_comments(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.comment_service.list(&claims, query.into()).await?;
    Ok(Json(page))
}

/// DELETE /api/comment/delete-comment/{id}
async fn delete_comment(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.comment_service.delete(&claims, &id).await?;
    Ok(Json(MessageResponse {
        message: "Kommentar wurde gelöscht.".to_string(),
    }))
}

/// POST /api/comment/create
async fn create_comment(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateCommentInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let comment = state.comment_service.create(&claims, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
