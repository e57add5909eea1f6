pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(auth_routes())
        .merge(post_routes())
        .merge(comment_routes())
        .merge(user_routes())
        // Every request gets a resolved Caller; handlers decide whether it matters
        .layer(from_fn_with_state(state.clone(), middleware::resolve_caller))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
}

fn post_routes() -> Router<AppState> {
    use handlers::posts;

    Router::new()
        .route("/post", get(posts::list).post(posts::create))
        .route(
            "/post/:id",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
}

fn comment_routes() -> Router<AppState> {
    use handlers::comments;

    Router::new()
        .route("/comment", get(comments::list).post(comments::create))
        .route("/comment/post/:post_id", get(comments::list_by_post))
        .route(
            "/comment/:id",
            get(comments::get).put(comments::update).delete(comments::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new().route(
        "/user/:id",
        get(users::get).put(users::update).delete(users::delete),
    )
}

/// Permissive when no origins are configured, otherwise an explicit allow-list
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
