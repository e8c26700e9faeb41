use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

/// Success envelope:
/// `{"statusCode", "data", "message", "success": true}`.
pub struct ApiOk<T: Serialize> {
    status: StatusCode,
    data: T,
    message: String,
}

impl<T: Serialize> ApiOk<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            data,
            message: message.into(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
            message: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiOk<T> {
    fn into_response(self) -> Response {
        let body = json!({
            "statusCode": self.status.as_u16(),
            "data": self.data,
            "message": self.message,
            "success": true,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Rows store ids as TEXT. A corrupt id degrades to the nil uuid with a
/// warning rather than failing the whole response.
pub fn parse_row_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_envelope_shape() {
        let resp = ApiOk::created(json!({"id": 7}), "Created").into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 201);
        assert_eq!(body["data"]["id"], 7);
        assert_eq!(body["message"], "Created");
        assert_eq!(body["success"], true);
    }

    #[test]
    fn corrupt_row_id_degrades_to_nil() {
        assert_eq!(parse_row_id("garbage"), Uuid::default());
    }
}
