use axum::{Router, body::Bytes, extract::DefaultBodyLimit, extract::State, routing::post};
use serde::Serialize;

use crate::error::ApiError;
use crate::response::ApiOk;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    id: String,
    url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(stage_asset))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Raw octet-stream upload. The returned id is what the JSON mutations
/// (register, publish video, avatar update, ...) reference.
async fn stage_asset(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiOk<UploadResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty upload".into()));
    }
    let stored = state.assets.store(&body).await?;
    Ok(ApiOk::created(
        UploadResponse {
            id: stored.id,
            url: stored.url,
        },
        "Asset staged",
    ))
}
