use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{authorize_owner_action, password::hash_password};
use crate::database::models::{PublicUser, User, UserChanges};
use crate::error::{ApiError, ApiResult};
use crate::middleware::Caller;
use crate::state::AppState;

use super::utils::{json_body, non_blank, parse_id};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// GET /user/:id - Public profile; requires a valid access token
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<PublicUser>> {
    let id = parse_id(&id, "user")?;
    let user = load(&state, id).await?;
    caller.require()?;
    Ok(Json(user.into()))
}

/// PUT /user/:id - Self-service profile update
///
/// A new password is hashed before it is stored. Taking an email or
/// username that belongs to someone else is a 400.
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let id = parse_id(&id, "user")?;
    let user = load(&state, id).await?;
    authorize_owner_action(&caller, user.id)?;

    let payload = json_body(payload)?;
    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };
    let changes = UserChanges {
        email: non_blank(payload.email),
        username: non_blank(payload.username),
        password_hash,
    };

    if changes.is_empty() {
        return Ok(Json(user.into()));
    }

    let updated = state
        .store
        .update_user(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(updated.into()))
}

/// DELETE /user/:id - Self-service account deletion
///
/// Posts and comments the user owns are left in place.
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "user")?;
    let user = load(&state, id).await?;
    authorize_owner_action(&caller, user.id)?;

    if !state.store.delete_user(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!("User {} deleted their account", id);
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<User> {
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
