use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tokens;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Access token from the `accessToken` cookie or `Authorization:
/// Bearer`; decoded claims become a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|v| v.to_string())
        })
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".into()))?;

    let claims = tokens::decode_access(&state.auth, &token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired access token".into()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
