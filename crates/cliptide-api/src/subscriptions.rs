use axum::{
    Extension, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use cliptide_types::api::{
    AccessClaims, LatestVideo, SubscribeToggleResponse, SubscribedChannelResponse,
    SubscriberResponse,
};

use cliptide_db::models::parse_ts;

use crate::error::{ApiError, parse_id};
use crate::middleware::require_auth;
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/toggle/{channel_id}", get(toggle_subscription))
        .route("/subscribers/{channel_id}", get(subscriber_list))
        .route("/channels/{subscriber_id}", get(subscribed_channels))
        .layer(from_fn_with_state(state, require_auth))
}

async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_id(&channel_id, "channel")?.to_string();
    let subscriber_id = claims.sub.to_string();
    let subscription_id = Uuid::new_v4().to_string();

    let subscribed = db_call(&state, move |db| {
        if db.get_user_by_id(&channel_id)?.is_none() {
            return Ok(None);
        }
        db.toggle_subscription(&subscription_id, &subscriber_id, &channel_id)
            .map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("channel"))?;

    Ok(ApiOk::new(
        SubscribeToggleResponse { subscribed },
        "Subscription toggled",
    ))
}

async fn subscriber_list(
    State(state): State<AppState>,
    Extension(_claims): Extension<AccessClaims>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = parse_id(&channel_id, "channel")?.to_string();

    let rows = db_call(&state, move |db| {
        if db.get_user_by_id(&channel_id)?.is_none() {
            return Ok(None);
        }
        db.subscriber_list(&channel_id).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("channel"))?;

    let subscribers: Vec<SubscriberResponse> = rows
        .into_iter()
        .map(|row| SubscriberResponse {
            id: parse_row_id(&row.id),
            username: row.username,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            subscribers_count: row.subscribers_count as u64,
            subscribed_to_subscriber: row.subscribed_to_subscriber,
        })
        .collect();

    Ok(ApiOk::new(subscribers, "Subscribers fetched"))
}

async fn subscribed_channels(
    State(state): State<AppState>,
    Extension(_claims): Extension<AccessClaims>,
    Path(subscriber_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriber_id = parse_id(&subscriber_id, "user")?.to_string();

    let rows = db_call(&state, move |db| db.subscribed_channels(&subscriber_id)).await?;

    let channels: Vec<SubscribedChannelResponse> = rows
        .into_iter()
        .map(|row| SubscribedChannelResponse {
            id: parse_row_id(&row.id),
            username: row.username,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            latest_video: row.latest_video.map(|v| LatestVideo {
                id: parse_row_id(&v.id),
                title: v.title,
                thumbnail_url: v.thumbnail_url,
                views: v.views as u64,
                created_at: parse_ts(&v.created_at),
            }),
        })
        .collect();

    Ok(ApiOk::new(channels, "Subscribed channels fetched"))
}
