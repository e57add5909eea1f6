use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::authorize_owner_action;
use crate::database::models::{Comment, NewComment};
use crate::database::StoreError;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Caller;
use crate::state::AppState;

use super::utils::{json_body, non_blank, parse_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub message: Option<String>,
}

/// GET /comment
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.store.list_comments(None).await?))
}

/// GET /comment/post/:postId - Comments on one post; empty when the post has none or is gone
pub async fn list_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let post_id = parse_id(&post_id, "post")?;
    Ok(Json(state.store.list_comments(Some(post_id)).await?))
}

/// GET /comment/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Comment>> {
    let id = parse_id(&id, "comment")?;
    Ok(Json(load(&state, id).await?))
}

/// POST /comment - Comment on an existing post as the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let user = caller.require()?;
    let payload = json_body(payload)?;

    let (Some(raw_post_id), Some(message)) = (non_blank(payload.post_id), non_blank(payload.message))
    else {
        return Err(ApiError::missing_fields(
            "postId and message are required",
            &["postId", "message"],
        ));
    };
    let post_id = parse_id(&raw_post_id, "post")?;

    if state.store.find_post(post_id).await?.is_none() {
        return Err(ApiError::not_found("Post not found for this comment"));
    }

    let comment = state
        .store
        .create_comment(NewComment {
            post_id,
            sender: user.user_id,
            message,
        })
        .await
        .map_err(|e| match e {
            // Post deleted after the existence check
            StoreError::MissingParent(_) => ApiError::not_found("Post not found for this comment"),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /comment/:id - Owner-only; only the message can change
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> ApiResult<Json<Comment>> {
    let id = parse_id(&id, "comment")?;
    let comment = load(&state, id).await?;
    authorize_owner_action(&caller, comment.sender)?;

    let message = non_blank(json_body(payload)?.message)
        .ok_or_else(|| ApiError::missing_fields("Message is required", &["message"]))?;

    let updated = state
        .store
        .update_comment(id, message)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    Ok(Json(updated))
}

/// DELETE /comment/:id - Owner-only
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "comment")?;
    let comment = load(&state, id).await?;
    authorize_owner_action(&caller, comment.sender)?;

    if !state.store.delete_comment(id).await? {
        return Err(ApiError::not_found("Comment not found"));
    }
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Comment> {
    state
        .store
        .find_comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))
}
