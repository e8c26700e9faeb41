use anyhow::anyhow;
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use cliptide_db::models::{VideoFeedRow, VideoRow, parse_ts};
use cliptide_db::pagination::Page;
use cliptide_db::views::{SortDirection, VideoListFilter, VideoSort};
use cliptide_types::api::{
    AccessClaims, ChannelOwner, PublishToggleResponse, PublishVideoRequest, UserSummary,
    VideoDetailResponse, VideoFeedItem, VideoListItem, VideoListOwner, VideoResponse,
    UpdateVideoRequest,
};

use crate::error::{ApiError, parse_id, require_field};
use crate::guard::assert_owner;
use crate::middleware::require_auth;
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};
use crate::storage::{AssetStore, replaced_blob};

pub fn routes(state: AppState) -> Router<AppState> {
    // the listing is public; everything else requires a principal
    Router::new()
        .route(
            "/",
            get(list_videos).merge(
                post(publish_video).layer(from_fn_with_state(state.clone(), require_auth)),
            ),
        )
        .merge(
            Router::new()
                .route(
                    "/{video_id}",
                    get(get_video).patch(update_video).delete(delete_video),
                )
                .route("/{video_id}/publish-toggle", patch(toggle_publish))
                .layer(from_fn_with_state(state, require_auth)),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

/// Sort keys are whitelisted; a client string never reaches the SQL.
fn parse_sort(query: &VideoListQuery) -> Result<(VideoSort, SortDirection), ApiError> {
    let sort = match query.sort_by.as_deref() {
        None | Some("createdAt") => VideoSort::CreatedAt,
        Some("views") => VideoSort::Views,
        Some("durationSeconds") => VideoSort::Duration,
        Some(other) => {
            return Err(ApiError::BadRequest(format!("Unsupported sortBy '{other}'")));
        }
    };
    let direction = match query.sort_type.as_deref() {
        None | Some("desc") => SortDirection::Desc,
        Some("asc") => SortDirection::Asc,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unsupported sortType '{other}'"
            )));
        }
    };
    Ok((sort, direction))
}

// -- Row mapping --

fn video_response(row: VideoRow) -> VideoResponse {
    VideoResponse {
        id: parse_row_id(&row.id),
        title: row.title,
        description: row.description,
        video_url: row.video_url,
        thumbnail_url: row.thumbnail_url,
        duration_seconds: row.duration_seconds,
        views: row.views as u64,
        is_published: row.is_published,
        owner_id: parse_row_id(&row.owner_id),
        created_at: parse_ts(&row.created_at),
    }
}

pub fn feed_item(row: VideoFeedRow) -> VideoFeedItem {
    VideoFeedItem {
        id: parse_row_id(&row.id),
        title: row.title,
        description: row.description,
        video_url: row.video_url,
        thumbnail_url: row.thumbnail_url,
        duration_seconds: row.duration_seconds,
        views: row.views as u64,
        created_at: parse_ts(&row.created_at),
        owner: UserSummary {
            id: parse_row_id(&row.owner_id),
            username: row.owner_username,
            display_name: row.owner_display_name,
            avatar_url: row.owner_avatar_url,
        },
    }
}

// -- Handlers --

async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (sort, direction) = parse_sort(&query)?;
    let owner_id = match &query.user_id {
        Some(raw) => Some(parse_id(raw, "user")?.to_string()),
        None => None,
    };
    let filter = VideoListFilter {
        query: query.query.clone().filter(|q| !q.trim().is_empty()),
        owner_id,
        sort,
        direction,
    };
    let page = Page::new(query.page, query.limit);

    let videos = db_call(&state, move |db| db.list_videos(&filter, page)).await?;
    let videos = videos.map(|row| VideoListItem {
        id: parse_row_id(&row.id),
        title: row.title,
        description: row.description,
        video_url: row.video_url,
        thumbnail_url: row.thumbnail_url,
        duration_seconds: row.duration_seconds,
        views: row.views as u64,
        created_at: parse_ts(&row.created_at),
        owner: VideoListOwner {
            id: parse_row_id(&row.owner_id),
            username: row.owner_username,
            avatar_url: row.owner_avatar_url,
        },
    });

    Ok(ApiOk::new(videos, "Videos fetched"))
}

async fn publish_video(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<PublishVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.title, "title")?;
    require_field(&req.description, "description")?;
    if !req.duration_seconds.is_finite() || req.duration_seconds <= 0.0 {
        return Err(ApiError::BadRequest(
            "durationSeconds must be positive".into(),
        ));
    }
    if !state.assets.exists(&req.video_asset_id).await {
        return Err(ApiError::BadRequest("Unknown video asset".into()));
    }
    if !state.assets.exists(&req.thumbnail_asset_id).await {
        return Err(ApiError::BadRequest("Unknown thumbnail asset".into()));
    }

    let video_id = Uuid::new_v4().to_string();
    let video = {
        let video_id = video_id.clone();
        let owner = claims.sub.to_string();
        let video_url = AssetStore::url_for(&req.video_asset_id);
        let thumbnail_url = AssetStore::url_for(&req.thumbnail_asset_id);
        db_call(&state, move |db| {
            db.create_video(
                &video_id,
                req.title.trim(),
                req.description.trim(),
                &req.video_asset_id,
                &video_url,
                &req.thumbnail_asset_id,
                &thumbnail_url,
                req.duration_seconds,
                &owner,
            )?;
            db.get_video_by_id(&video_id)
        })
        .await?
    };

    let video =
        video.ok_or_else(|| ApiError::Internal(anyhow!("video row missing after insert")))?;
    Ok(ApiOk::created(video_response(video), "Video published"))
}

async fn get_video(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "video")?.to_string();
    let viewer = claims.sub.to_string();

    let detail = {
        let video_id = video_id.clone();
        let viewer = viewer.clone();
        db_call(&state, move |db| db.video_detail(&video_id, &viewer)).await?
    }
    .ok_or(ApiError::NotFound("video"))?;

    // side effect of a successful read: view++ and history append
    db_call(&state, move |db| db.record_view(&video_id, &viewer)).await?;

    Ok(ApiOk::new(
        VideoDetailResponse {
            id: parse_row_id(&detail.id),
            title: detail.title,
            description: detail.description,
            video_url: detail.video_url,
            duration_seconds: detail.duration_seconds,
            views: detail.views as u64,
            created_at: parse_ts(&detail.created_at),
            likes_count: detail.likes_count as u64,
            is_liked: detail.is_liked,
            owner: ChannelOwner {
                id: parse_row_id(&detail.owner_id),
                username: detail.owner_username,
                avatar_url: detail.owner_avatar_url,
                subscribers_count: detail.owner_subscribers_count as u64,
                is_subscribed: detail.owner_is_subscribed,
            },
        },
        "Video fetched",
    ))
}

async fn update_video(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
    Json(req): Json<UpdateVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "video")?.to_string();
    require_field(&req.title, "title")?;
    require_field(&req.description, "description")?;

    let existing = {
        let video_id = video_id.clone();
        db_call(&state, move |db| db.get_video_by_id(&video_id)).await?
    };
    let existing = assert_owner(existing, |v| &v.owner_id, &claims.sub.to_string(), "video")?;

    if let Some(asset) = &req.video_asset_id {
        if !state.assets.exists(asset).await {
            return Err(ApiError::BadRequest("Unknown video asset".into()));
        }
    }
    if let Some(asset) = &req.thumbnail_asset_id {
        if !state.assets.exists(asset).await {
            return Err(ApiError::BadRequest("Unknown thumbnail asset".into()));
        }
    }

    // a resubmitted current id is not a swap, so its blob survives
    let replaced: Vec<String> = [
        req.video_asset_id
            .as_deref()
            .and_then(|new| replaced_blob(&existing.video_id, new)),
        req.thumbnail_asset_id
            .as_deref()
            .and_then(|new| replaced_blob(&existing.thumbnail_id, new)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let updated = {
        let video_id = video_id.clone();
        let title = req.title.trim().to_string();
        let description = req.description.trim().to_string();
        let video_asset = req
            .video_asset_id
            .map(|id| (AssetStore::url_for(&id), id));
        let thumbnail_asset = req
            .thumbnail_asset_id
            .map(|id| (AssetStore::url_for(&id), id));
        db_call(&state, move |db| {
            db.update_video(
                &video_id,
                &title,
                &description,
                video_asset.as_ref().map(|(url, id)| (id.as_str(), url.as_str())),
                thumbnail_asset
                    .as_ref()
                    .map(|(url, id)| (id.as_str(), url.as_str())),
            )?;
            db.get_video_by_id(&video_id)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("video"))?;

    // replaced blobs go after the row update commits, best-effort
    for old in replaced {
        if let Err(e) = state.assets.delete(&old).await {
            warn!("Failed to delete replaced asset '{}': {:#}", old, e);
        }
    }

    Ok(ApiOk::new(video_response(updated), "Video updated"))
}

async fn delete_video(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "video")?.to_string();

    let existing = {
        let video_id = video_id.clone();
        db_call(&state, move |db| db.get_video_by_id(&video_id)).await?
    };
    let existing = assert_owner(existing, |v| &v.owner_id, &claims.sub.to_string(), "video")?;

    db_call(&state, move |db| db.delete_video_cascade(&video_id)).await?;

    // blob deletes are best-effort and never roll the row delete back
    for asset in [&existing.video_id, &existing.thumbnail_id] {
        if let Err(e) = state.assets.delete(asset).await {
            warn!("Failed to delete asset '{}': {:#}", asset, e);
        }
    }

    Ok(ApiOk::new(serde_json::json!({}), "Video deleted"))
}

async fn toggle_publish(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "video")?.to_string();

    let existing = {
        let video_id = video_id.clone();
        db_call(&state, move |db| db.get_video_by_id(&video_id)).await?
    };
    let existing = assert_owner(existing, |v| &v.owner_id, &claims.sub.to_string(), "video")?;

    let now_published = !existing.is_published;
    db_call(&state, move |db| {
        db.set_publish_status(&video_id, now_published)
    })
    .await?;

    Ok(ApiOk::new(
        PublishToggleResponse {
            is_published: now_published,
        },
        "Publish status toggled",
    ))
}

#[cfg(test)]
mod tests {
    use super::{VideoListQuery, parse_sort};
    use cliptide_db::views::{SortDirection, VideoSort};

    #[test]
    fn sort_defaults_to_created_at_desc() {
        let (sort, direction) = parse_sort(&VideoListQuery::default()).unwrap();
        assert_eq!(sort, VideoSort::CreatedAt);
        assert_eq!(direction, SortDirection::Desc);
    }

    #[test]
    fn sort_keys_are_whitelisted() {
        let query = VideoListQuery {
            sort_by: Some("views".into()),
            sort_type: Some("asc".into()),
            ..Default::default()
        };
        let (sort, direction) = parse_sort(&query).unwrap();
        assert_eq!(sort, VideoSort::Views);
        assert_eq!(direction, SortDirection::Asc);

        let query = VideoListQuery {
            sort_by: Some("password; DROP TABLE users".into()),
            ..Default::default()
        };
        assert!(parse_sort(&query).is_err());
    }
}
