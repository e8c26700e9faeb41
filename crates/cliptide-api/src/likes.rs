use axum::{
    Extension, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use cliptide_db::queries::likes::LikeTarget;
use cliptide_types::api::{AccessClaims, LikeToggleResponse, VideoFeedItem};

use crate::error::{ApiError, parse_id};
use crate::middleware::require_auth;
use crate::response::ApiOk;
use crate::state::{AppState, db_call};
use crate::videos::feed_item;

// The toggle routes mutate behind a GET verb. Clients call them as
// commands, not reads.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/toggle/video/{video_id}", get(toggle_video_like))
        .route("/toggle/comment/{comment_id}", get(toggle_comment_like))
        .route("/toggle/tweet/{tweet_id}", get(toggle_tweet_like))
        .route("/videos", get(liked_videos))
        .layer(from_fn_with_state(state, require_auth))
}

/// Shared toggle: the target must exist before the flip.
async fn toggle(
    state: &AppState,
    target: LikeTarget,
    raw_id: &str,
    liked_by: String,
) -> Result<ApiOk<LikeToggleResponse>, ApiError> {
    let what = match target {
        LikeTarget::Video => "video",
        LikeTarget::Comment => "comment",
        LikeTarget::Tweet => "tweet",
    };
    let target_id = parse_id(raw_id, what)?.to_string();
    let like_id = Uuid::new_v4().to_string();

    let is_liked = db_call(state, move |db| {
        let exists = match target {
            LikeTarget::Video => db.get_video_by_id(&target_id)?.is_some(),
            LikeTarget::Comment => db.get_comment_by_id(&target_id)?.is_some(),
            LikeTarget::Tweet => db.get_tweet_by_id(&target_id)?.is_some(),
        };
        if !exists {
            return Ok(None);
        }
        db.toggle_like(&like_id, target, &target_id, &liked_by)
            .map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound(what))?;

    Ok(ApiOk::new(
        LikeToggleResponse { is_liked },
        "Like toggled",
    ))
}

async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(&state, LikeTarget::Video, &video_id, claims.sub.to_string()).await
}

async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(
        &state,
        LikeTarget::Comment,
        &comment_id,
        claims.sub.to_string(),
    )
    .await
}

async fn toggle_tweet_like(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(&state, LikeTarget::Tweet, &tweet_id, claims.sub.to_string()).await
}

async fn liked_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = {
        let liker = claims.sub.to_string();
        db_call(&state, move |db| db.liked_videos(&liker)).await?
    };
    let videos: Vec<VideoFeedItem> = rows.into_iter().map(feed_item).collect();
    Ok(ApiOk::new(videos, "Liked videos fetched"))
}
