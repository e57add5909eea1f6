// handlers/mod.rs - Route handlers grouped by resource
//
// Security model:
//   auth/*       public; refresh and logout authenticate with the refresh token itself
//   GET          public, except user profiles which need an access token
//   POST         access token required; the caller becomes the owner
//   PUT/DELETE   access token required and the caller must own the resource
//
// Id-addressed handlers check, in order: malformed id (400), missing
// resource (404), missing or invalid identity (401), ownership (403).

pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;
pub mod utils;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service information
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "postboard-api",
        "version": version,
        "endpoints": {
            "auth": "/auth/register, /auth/login, /auth/refresh-token, /auth/logout (public)",
            "posts": "/post[/:id] (writes require a bearer token)",
            "comments": "/comment[/:id], /comment/post/:postId (writes require a bearer token)",
            "users": "/user/:id (bearer token required)",
            "health": "/health"
        }
    }))
}

/// GET /health - Liveness including the backing store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
