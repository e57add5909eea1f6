use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::TokenPair;
use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::{json_body, non_blank};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

impl RefreshRequest {
    fn into_token(self) -> ApiResult<String> {
        non_blank(self.refresh_token)
            .ok_or_else(|| ApiError::missing_fields("Refresh token is required", &["refreshToken"]))
    }
}

/// POST /auth/login - Authenticate with email and password
///
/// Unknown email and wrong password produce the same 400 response.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let payload = json_body(payload)?;

    let email = non_blank(payload.email);
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::missing_fields(
            "Email and password are required",
            &["email", "password"],
        ));
    };

    let tokens = state.sessions.login(&email, &password).await?;
    Ok(Json(tokens))
}

/// POST /auth/refresh-token - Rotate a refresh token
///
/// Expected Input:
/// ```json
/// { "refreshToken": "eyJ..." }
/// ```
///
/// The presented token is consumed. Presenting a token that was already
/// consumed revokes every refresh token the user holds.
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let token = json_body(payload)?.into_token()?;
    let tokens = state.sessions.refresh(&token).await?;
    Ok(Json(tokens))
}

/// POST /auth/logout - Retire a refresh token
pub async fn logout(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let token = json_body(payload)?.into_token()?;
    state.sessions.logout(&token).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}
