use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::authorize_owner_action;
use crate::database::models::{NewPost, Post, PostChanges};
use crate::error::{ApiError, ApiResult};
use crate::middleware::Caller;
use crate::state::AppState;

use super::utils::{json_body, non_blank, parse_id};

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    /// Only posts owned by this user id
    pub sender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: Option<String>,
    pub message: Option<String>,
}

/// GET /post - All posts, optionally filtered by `?sender=<userId>`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let sender = match non_blank(query.sender) {
        Some(raw) => Some(parse_id(&raw, "sender")?),
        None => None,
    };
    Ok(Json(state.store.list_posts(sender).await?))
}

/// GET /post/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Post>> {
    let id = parse_id(&id, "post")?;
    let post = load(&state, id).await?;
    Ok(Json(post))
}

/// POST /post - Create a post owned by the caller
///
/// Any `sender` in the body is ignored.
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let user = caller.require()?;
    let payload = json_body(payload)?;

    let message = non_blank(payload.message)
        .ok_or_else(|| ApiError::missing_fields("Message is required", &["message"]))?;

    let post = state
        .store
        .create_post(NewPost {
            sender: user.user_id,
            title: non_blank(payload.title),
            message,
        })
        .await?;

    tracing::debug!("User {} created post {}", user.user_id, post.id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /post/:id - Owner-only update of title and/or message
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let id = parse_id(&id, "post")?;
    let post = load(&state, id).await?;
    authorize_owner_action(&caller, post.sender)?;

    let payload = json_body(payload)?;
    if payload.message.is_some() && non_blank(payload.message.clone()).is_none() {
        return Err(ApiError::validation_error("Message cannot be empty", None));
    }

    let changes = PostChanges {
        title: non_blank(payload.title),
        message: non_blank(payload.message),
    };

    let updated = state
        .store
        .update_post(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(updated))
}

/// DELETE /post/:id - Owner-only; removes the post's comments as well
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "post")?;
    let post = load(&state, id).await?;
    let user_id = authorize_owner_action(&caller, post.sender)?;

    if !state.store.delete_post(id).await? {
        return Err(ApiError::not_found("Post not found"));
    }

    tracing::info!("User {} deleted post {} and its comments", user_id, id);
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

async fn load(state: &AppState, id: uuid::Uuid) -> ApiResult<Post> {
    state
        .store
        .find_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}
