use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    http::header,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use cliptide_db::models::{UserRow, parse_ts};
use cliptide_types::api::{
    AccessClaims, ChangePasswordRequest, ChannelProfileResponse, LoginRequest, LoginResponse,
    RefreshRequest, RegisterRequest, TokenPairResponse, UpdateAssetRequest, UpdateDetailsRequest,
    UserResponse, UserSummary, VideoFeedItem,
};

use crate::error::{ApiError, require_field};
use crate::middleware::{ACCESS_COOKIE, REFRESH_COOKIE, require_auth};
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};
use crate::storage::{AssetStore, replaced_blob};
use crate::tokens;
use crate::videos::feed_item;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/update-password", post(update_password))
        .route("/get-user", post(current_user))
        .route("/update-details", patch(update_details))
        .route("/update-avatar", patch(update_avatar))
        .route("/update-coverimage", patch(update_cover_image))
        .route(
            "/get-channel-profile/{username}",
            get(channel_profile).post(channel_profile),
        )
        .route("/get-watch-history", get(watch_history))
        .layer(from_fn_with_state(state, require_auth));

    public.merge(protected)
}

// -- Password hashing --

/// Argon2id with a fresh random salt. An explicit, named step: password
/// hashing never hides inside a save path.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow!("password hash: {e}")))
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| ApiError::Internal(anyhow!("stored hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// -- Row mapping --

pub fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: parse_row_id(&row.id),
        username: row.username,
        email: row.email,
        display_name: row.display_name,
        avatar_url: row.avatar_url,
        cover_image_url: row.cover_image_url,
        created_at: parse_ts(&row.created_at),
    }
}

pub fn user_summary(row: &UserRow) -> UserSummary {
    UserSummary {
        id: parse_row_id(&row.id),
        username: row.username.clone(),
        display_name: row.display_name.clone(),
        avatar_url: row.avatar_url.clone(),
    }
}

// -- Cookies --

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

fn set_auth_cookies(jar: CookieJar, access: &str, refresh: &str) -> CookieJar {
    jar.add(auth_cookie(ACCESS_COOKIE, access.to_string()))
        .add(auth_cookie(REFRESH_COOKIE, refresh.to_string()))
}

fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_COOKIE).path("/").build())
}

/// Mint an access/refresh pair and persist the refresh token on the
/// user row (rotation guard).
async fn issue_tokens(state: &AppState, user: &UserRow) -> Result<(String, String), ApiError> {
    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {e}", user.id)))?;

    let access = tokens::mint_access(&state.auth, user_id, &user.username, &user.email)?;
    let refresh = tokens::mint_refresh(&state.auth, user_id)?;

    let id = user.id.clone();
    let stored = refresh.clone();
    db_call(state, move |db| db.set_refresh_token(&id, Some(&stored))).await?;

    Ok((access, refresh))
}

// -- Handlers --

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.username, "username")?;
    require_field(&req.email, "email")?;
    require_field(&req.display_name, "displayName")?;
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let username = req.username.trim().to_lowercase();
    let email = req.email.trim().to_lowercase();

    if !state.assets.exists(&req.avatar_asset_id).await {
        return Err(ApiError::BadRequest("Unknown avatar asset".into()));
    }
    if let Some(cover) = &req.cover_image_asset_id {
        if !state.assets.exists(cover).await {
            return Err(ApiError::BadRequest("Unknown cover image asset".into()));
        }
    }

    let existing = {
        let username = username.clone();
        let email = email.clone();
        db_call(&state, move |db| {
            db.find_user_by_username_or_email(&username, &email)
        })
        .await?
    };
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User with this username or email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4().to_string();

    let created = {
        let user_id = user_id.clone();
        let display_name = req.display_name.trim().to_string();
        let avatar_id = req.avatar_asset_id.clone();
        let avatar_url = AssetStore::url_for(&req.avatar_asset_id);
        let cover = req
            .cover_image_asset_id
            .as_ref()
            .map(|id| (id.clone(), AssetStore::url_for(id)));
        db_call(&state, move |db| {
            db.create_user(
                &user_id,
                &username,
                &email,
                &display_name,
                &password_hash,
                &avatar_id,
                &avatar_url,
                cover.as_ref().map(|(id, _)| id.as_str()),
                cover.as_ref().map(|(_, url)| url.as_str()),
            )?;
            db.get_user_by_id(&user_id)
        })
        .await?
    };

    let user = created.ok_or_else(|| ApiError::Internal(anyhow!("user row missing after insert")))?;
    Ok(ApiOk::created(
        user_response(user),
        "User registered successfully",
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identifier = req
        .username
        .or(req.email)
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("username or email is required".into()))?;

    let user = {
        let identifier = identifier.clone();
        db_call(&state, move |db| {
            db.find_user_by_username_or_email(&identifier, &identifier)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    if !verify_password(&req.password, &user.password)? {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let (access, refresh) = issue_tokens(&state, &user).await?;
    let jar = set_auth_cookies(jar, &access, &refresh);

    Ok((
        jar,
        ApiOk::new(
            LoginResponse {
                user: user_response(user),
                access_token: access,
                refresh_token: refresh,
            },
            "Logged in successfully",
        ),
    ))
}

async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    db_call(&state, move |db| db.set_refresh_token(&id, None)).await?;

    let jar = clear_auth_cookies(jar);
    Ok((jar, ApiOk::new(json!({}), "Logged out")))
}

/// Rotate the token pair. The presented refresh token may come from the
/// request body, the `refreshToken` cookie, or a bearer header, and
/// must match the stored copy.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = body
        .and_then(|Json(req)| req.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|v| v.to_string())
        })
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".into()))?;

    let claims = tokens::decode_refresh(&state.auth, &presented)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired refresh token".into()))?;

    let user = {
        let id = claims.sub.to_string();
        db_call(&state, move |db| db.get_user_by_id(&id)).await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(ApiError::Unauthorized(
            "Refresh token has been rotated".into(),
        ));
    }

    let (access, refresh) = issue_tokens(&state, &user).await?;
    let jar = set_auth_cookies(jar, &access, &refresh);

    Ok((
        jar,
        ApiOk::new(
            TokenPairResponse {
                access_token: access,
                refresh_token: refresh,
            },
            "Token pair refreshed",
        ),
    ))
}

async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.new_password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let user = {
        let id = claims.sub.to_string();
        db_call(&state, move |db| db.get_user_by_id(&id)).await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    if !verify_password(&req.old_password, &user.password)? {
        return Err(ApiError::BadRequest("Old password is incorrect".into()));
    }

    let password_hash = hash_password(&req.new_password)?;
    let id = user.id;
    db_call(&state, move |db| db.update_password(&id, &password_hash)).await?;

    Ok(ApiOk::new(json!({}), "Password changed successfully"))
}

async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = {
        let id = claims.sub.to_string();
        db_call(&state, move |db| db.get_user_by_id(&id)).await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    Ok(ApiOk::new(user_response(user), "Current user"))
}

async fn update_details(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<UpdateDetailsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.display_name, "displayName")?;
    require_field(&req.email, "email")?;

    let user = {
        let id = claims.sub.to_string();
        let display_name = req.display_name.trim().to_string();
        let email = req.email.trim().to_lowercase();
        db_call(&state, move |db| {
            if !db.update_user_details(&id, &display_name, &email)? {
                return Ok(None);
            }
            db.get_user_by_id(&id)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    Ok(ApiOk::new(user_response(user), "Account details updated"))
}

async fn update_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.assets.exists(&req.asset_id).await {
        return Err(ApiError::BadRequest("Unknown avatar asset".into()));
    }

    let user = {
        let id = claims.sub.to_string();
        db_call(&state, move |db| db.get_user_by_id(&id)).await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    // best-effort removal of the replaced blob; a self-replacement keeps it
    if let Some(old) = replaced_blob(&user.avatar_id, &req.asset_id) {
        if let Err(e) = state.assets.delete(&old).await {
            warn!("Failed to delete old avatar '{}': {:#}", old, e);
        }
    }

    let updated = {
        let id = user.id.clone();
        let asset_id = req.asset_id.clone();
        let url = AssetStore::url_for(&req.asset_id);
        db_call(&state, move |db| {
            db.update_user_avatar(&id, &asset_id, &url)?;
            db.get_user_by_id(&id)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    Ok(ApiOk::new(user_response(updated), "Avatar updated"))
}

async fn update_cover_image(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.assets.exists(&req.asset_id).await {
        return Err(ApiError::BadRequest("Unknown cover image asset".into()));
    }

    let user = {
        let id = claims.sub.to_string();
        db_call(&state, move |db| db.get_user_by_id(&id)).await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    let old_cover = user
        .cover_image_id
        .as_deref()
        .and_then(|old| replaced_blob(old, &req.asset_id));
    if let Some(old) = old_cover {
        if let Err(e) = state.assets.delete(&old).await {
            warn!("Failed to delete old cover image '{}': {:#}", old, e);
        }
    }

    let updated = {
        let id = user.id.clone();
        let asset_id = req.asset_id.clone();
        let url = AssetStore::url_for(&req.asset_id);
        db_call(&state, move |db| {
            db.update_user_cover_image(&id, &asset_id, &url)?;
            db.get_user_by_id(&id)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("user"))?;

    Ok(ApiOk::new(user_response(updated), "Cover image updated"))
}

async fn channel_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&username, "username")?;

    let profile = {
        let username = username.trim().to_lowercase();
        let viewer = claims.sub.to_string();
        db_call(&state, move |db| db.channel_profile(&username, &viewer)).await?
    }
    .ok_or(ApiError::NotFound("channel"))?;

    Ok(ApiOk::new(
        ChannelProfileResponse {
            id: parse_row_id(&profile.id),
            username: profile.username,
            display_name: profile.display_name,
            email: profile.email,
            avatar_url: profile.avatar_url,
            cover_image_url: profile.cover_image_url,
            subscribers_count: profile.subscribers_count as u64,
            channel_subscribed_to_count: profile.channel_subscribed_to_count as u64,
            is_subscribed: profile.is_subscribed,
        },
        "Channel profile fetched",
    ))
}

async fn watch_history(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = {
        let viewer = claims.sub.to_string();
        db_call(&state, move |db| db.watch_history(&viewer)).await?
    };

    let history: Vec<VideoFeedItem> = rows.into_iter().map(feed_item).collect();
    Ok(ApiOk::new(history, "Watch history fetched"))
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        // fresh salt every time
        let a = hash_password("hunter2hunter2").unwrap();
        let b = hash_password("hunter2hunter2").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("hunter2hunter2", &a).unwrap());
        assert!(verify_password("hunter2hunter2", &b).unwrap());
    }

    #[test]
    fn garbage_stored_hash_is_an_internal_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
