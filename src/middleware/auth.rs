use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::state::AppState;

/// Authenticated user context extracted from an access token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Who is making the request, as far as the access token can tell.
///
/// Resolution never rejects a request by itself: handlers decide when the
/// identity matters, so id and existence checks can run first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    Authenticated(AuthUser),
    /// No bearer credentials were presented.
    Anonymous,
    /// A bearer token was presented but did not verify.
    Rejected,
}

impl Caller {
    /// The verified identity, or the 401-class reason there is none
    pub fn require(&self) -> Result<&AuthUser, AuthError> {
        match self {
            Caller::Authenticated(user) => Ok(user),
            Caller::Anonymous => Err(AuthError::Unauthorized),
            Caller::Rejected => Err(AuthError::InvalidToken),
        }
    }
}

/// Resolve the caller from the `Authorization` header and attach it to the request
pub async fn resolve_caller(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = match extract_bearer_token(&headers) {
        Ok(Some(token)) => match state.tokens.verify_access(token) {
            Ok(user_id) => Caller::Authenticated(AuthUser { user_id }),
            Err(_) => Caller::Rejected,
        },
        Ok(None) => Caller::Anonymous,
        Err(msg) => {
            tracing::debug!("Ignoring Authorization header: {}", msg);
            Caller::Rejected
        }
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Extract the bearer token from the Authorization header.
///
/// A missing header or a non-Bearer scheme yields `Ok(None)`; a Bearer
/// header that cannot be read or carries no token is an error.
fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty bearer token"),
        Some(token) => Ok(Some(token.trim())),
        None => Ok(None),
    }
}
