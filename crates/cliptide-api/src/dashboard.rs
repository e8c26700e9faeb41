use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};

use cliptide_db::models::parse_ts;
use cliptide_types::api::{AccessClaims, ChannelStatsResponse, DashboardVideoItem};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
        .layer(from_fn_with_state(state, require_auth))
}

async fn channel_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = {
        let owner = claims.sub.to_string();
        db_call(&state, move |db| db.channel_stats(&owner)).await?
    };

    Ok(ApiOk::new(
        ChannelStatsResponse {
            total_subscribers: stats.total_subscribers as u64,
            total_videos: stats.total_videos as u64,
            total_views: stats.total_views as u64,
            total_likes: stats.total_likes as u64,
        },
        "Channel stats fetched",
    ))
}

async fn channel_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = {
        let owner = claims.sub.to_string();
        db_call(&state, move |db| db.dashboard_videos(&owner)).await?
    };

    let videos: Vec<DashboardVideoItem> = rows
        .into_iter()
        .map(|row| DashboardVideoItem {
            id: parse_row_id(&row.id),
            title: row.title,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            is_published: row.is_published,
            likes_count: row.likes_count as u64,
            views: row.views as u64,
            created_at: parse_ts(&row.created_at),
        })
        .collect();

    Ok(ApiOk::new(videos, "Channel videos fetched"))
}
