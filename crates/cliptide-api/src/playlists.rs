use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post},
};
use uuid::Uuid;

use cliptide_db::models::{PlaylistDetailRow, parse_ts};
use cliptide_types::api::{AccessClaims, PlaylistRequest, PlaylistResponse, PlaylistVideo, UserSummary};

use crate::error::{ApiError, parse_id, require_field};
use crate::guard::assert_owner;
use crate::middleware::require_auth;
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{user_id}", get(user_playlists))
        .route(
            "/{playlist_id}",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/{playlist_id}/{video_id}", patch(add_video))
        .route("/remove/{playlist_id}/{video_id}", patch(remove_video))
        .layer(from_fn_with_state(state, require_auth))
}

fn playlist_response(row: PlaylistDetailRow, include_owner: bool) -> PlaylistResponse {
    PlaylistResponse {
        id: parse_row_id(&row.id),
        name: row.name,
        description: row.description,
        created_at: parse_ts(&row.created_at),
        updated_at: parse_ts(&row.updated_at),
        total_videos: row.total_videos as u64,
        total_views: row.total_views as u64,
        videos: row
            .videos
            .into_iter()
            .map(|v| PlaylistVideo {
                id: parse_row_id(&v.id),
                title: v.title,
                description: v.description,
                video_url: v.video_url,
                thumbnail_url: v.thumbnail_url,
                duration_seconds: v.duration_seconds,
                views: v.views as u64,
                created_at: parse_ts(&v.created_at),
            })
            .collect(),
        owner: include_owner.then_some(UserSummary {
            id: parse_row_id(&row.owner_id),
            username: row.owner_username,
            display_name: row.owner_display_name,
            avatar_url: row.owner_avatar_url,
        }),
    }
}

async fn create_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<PlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.name, "name")?;
    require_field(&req.description, "description")?;

    let playlist_id = Uuid::new_v4().to_string();
    let owner_id = claims.sub.to_string();

    let detail = {
        let playlist_id = playlist_id.clone();
        db_call(&state, move |db| {
            db.create_playlist(
                &playlist_id,
                req.name.trim(),
                req.description.trim(),
                &owner_id,
            )?;
            db.playlist_detail(&playlist_id)
        })
        .await?
    }
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("playlist row missing after insert")))?;

    Ok(ApiOk::created(
        playlist_response(detail, true),
        "Playlist created",
    ))
}

async fn get_playlist(
    State(state): State<AppState>,
    Extension(_claims): Extension<AccessClaims>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?.to_string();

    let detail = db_call(&state, move |db| db.playlist_detail(&playlist_id))
        .await?
        .ok_or(ApiError::NotFound("playlist"))?;

    Ok(ApiOk::new(playlist_response(detail, true), "Playlist fetched"))
}

async fn update_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(playlist_id): Path<String>,
    Json(req): Json<PlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?.to_string();
    require_field(&req.name, "name")?;
    require_field(&req.description, "description")?;

    let existing = {
        let playlist_id = playlist_id.clone();
        db_call(&state, move |db| db.get_playlist_by_id(&playlist_id)).await?
    };
    assert_owner(existing, |p| &p.owner_id, &claims.sub.to_string(), "playlist")?;

    let detail = {
        let playlist_id = playlist_id.clone();
        db_call(&state, move |db| {
            db.update_playlist(&playlist_id, req.name.trim(), req.description.trim())?;
            db.playlist_detail(&playlist_id)
        })
        .await?
    }
    .ok_or(ApiError::NotFound("playlist"))?;

    Ok(ApiOk::new(playlist_response(detail, true), "Playlist updated"))
}

async fn delete_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?.to_string();

    let existing = {
        let playlist_id = playlist_id.clone();
        db_call(&state, move |db| db.get_playlist_by_id(&playlist_id)).await?
    };
    assert_owner(existing, |p| &p.owner_id, &claims.sub.to_string(), "playlist")?;

    db_call(&state, move |db| db.delete_playlist_cascade(&playlist_id)).await?;

    Ok(ApiOk::new(serde_json::json!({}), "Playlist deleted"))
}

/// Membership mutation shared by add and remove.
async fn mutate_members(
    state: &AppState,
    claims: &AccessClaims,
    raw_playlist: &str,
    raw_video: &str,
    add: bool,
) -> Result<ApiOk<PlaylistResponse>, ApiError> {
    let playlist_id = parse_id(raw_playlist, "playlist")?.to_string();
    let video_id = parse_id(raw_video, "video")?.to_string();

    let existing = {
        let playlist_id = playlist_id.clone();
        db_call(state, move |db| db.get_playlist_by_id(&playlist_id)).await?
    };
    assert_owner(existing, |p| &p.owner_id, &claims.sub.to_string(), "playlist")?;

    let detail = db_call(state, move |db| {
        if db.get_video_by_id(&video_id)?.is_none() {
            return Ok(None);
        }
        if add {
            db.add_video_to_playlist(&playlist_id, &video_id)?;
        } else {
            db.remove_video_from_playlist(&playlist_id, &video_id)?;
        }
        db.playlist_detail(&playlist_id)
    })
    .await?
    .ok_or(ApiError::NotFound("video"))?;

    let message = if add {
        "Video added to playlist"
    } else {
        "Video removed from playlist"
    };
    Ok(ApiOk::new(playlist_response(detail, true), message))
}

async fn add_video(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    mutate_members(&state, &claims, &playlist_id, &video_id, true).await
}

async fn remove_video(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    mutate_members(&state, &claims, &playlist_id, &video_id, false).await
}

async fn user_playlists(
    State(state): State<AppState>,
    Extension(_claims): Extension<AccessClaims>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = parse_id(&user_id, "user")?.to_string();

    let rows = db_call(&state, move |db| db.user_playlists(&owner_id)).await?;
    let playlists: Vec<PlaylistResponse> = rows
        .into_iter()
        .map(|row| playlist_response(row, false))
        .collect();

    Ok(ApiOk::new(playlists, "Playlists fetched"))
}
