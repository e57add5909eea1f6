use axum::{extract::rejection::JsonRejection, Json};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Parse a path or body identifier, reporting which entity it was meant for
pub fn parse_id(raw: &str, entity: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_id(entity))
}

/// Trimmed text, or `None` when absent or blank
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Unwrap a JSON body extracted as `Result`, turning rejections into `InvalidJson`.
///
/// Handlers extract bodies this way so identity and ownership checks can run
/// before the body is looked at.
pub fn json_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuids_only() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "post").unwrap(), id);

        let err = parse_id("12345", "post").unwrap_err();
        assert_eq!(err.message(), "Invalid post ID");
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  hi ".into())), Some("hi".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
