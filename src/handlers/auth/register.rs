use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::{json_body, non_blank};
use crate::services::Registration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

/// POST /auth/register - Create an account and open its first session
///
/// Expected Input:
/// ```json
/// {
///   "email": "string",      // Required
///   "password": "string",   // Required
///   "username": "string"    // Optional, defaults to the email
/// }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "token": "eyJ...", "refreshToken": "eyJ...", "userId": "uuid" }
/// ```
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let payload = json_body(payload)?;

    let email = non_blank(payload.email);
    // Passwords are taken verbatim; only emptiness is rejected
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::missing_fields(
            "Email and password are required",
            &["email", "password"],
        ));
    };
    let username = non_blank(payload.username);

    let registration = state
        .sessions
        .register(&email, &password, username.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(registration)))
}
