use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Public error taxonomy. Every handler returns `Result<_, ApiError>`
/// and the error renders the same JSON envelope as success responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    /// Ownership failures. Renders as 400, not 403.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Classify an error bubbling out of the store. Unique-index and
    /// other constraint failures are races a concurrent client lost,
    /// not server faults.
    pub fn from_db(err: anyhow::Error) -> Self {
        if cliptide_db::is_constraint_violation(&err) {
            return ApiError::Conflict("Resource already exists".into());
        }
        ApiError::Internal(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Forbidden(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(cause) => {
                // Cause stays server-side.
                error!("Internal error: {:#}", cause);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = json!({
            "statusCode": status.as_u16(),
            "message": message,
            "success": false,
            "errors": [],
        });
        (status, Json(body)).into_response()
    }
}

/// Path ids arrive as raw strings; parsing them by hand keeps malformed
/// ids inside the uniform envelope instead of axum's default rejection.
pub fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} id")))
}

pub fn require_field(value: &str, what: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{what} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        // ownership failures surface as 400
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("video").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn error_envelope_shape() {
        let resp = ApiError::NotFound("video").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "video not found");
        assert_eq!(body["success"], false);
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn internal_error_hides_the_cause() {
        let resp = ApiError::Internal(anyhow::anyhow!("db exploded")).into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn store_constraint_violations_surface_as_conflict() {
        let db = cliptide_db::Database::open_in_memory().unwrap();
        db.create_user(
            "id-1",
            "alice",
            "alice@example.com",
            "Alice",
            "$argon2id$fake-hash",
            "avatar-asset",
            "/assets/avatar",
            None,
            None,
        )
        .unwrap();

        // same username, racing past any check-then-act
        let err = db
            .create_user(
                "id-2",
                "alice",
                "other@example.com",
                "Alice",
                "$argon2id$fake-hash",
                "avatar-asset",
                "/assets/avatar",
                None,
                None,
            )
            .unwrap_err();

        let api = ApiError::from_db(err);
        assert!(matches!(api, ApiError::Conflict(_)));
        assert_eq!(api.status(), StatusCode::CONFLICT);

        let plain = ApiError::from_db(anyhow::anyhow!("disk on fire"));
        assert!(matches!(plain, ApiError::Internal(_)));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("550e8400-e29b-41d4-a716-446655440000", "video").is_ok());
        assert!(parse_id("not-a-uuid", "video").is_err());
    }
}
