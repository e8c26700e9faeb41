use axum::{Router, routing::get};

use crate::response::ApiOk;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(healthcheck))
}

async fn healthcheck() -> ApiOk<&'static str> {
    ApiOk::new("OK", "Service is healthy")
}
