use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use cliptide_db::models::parse_ts;
use cliptide_db::pagination::Page;
use cliptide_db::queries::likes::LikeTarget;
use cliptide_types::api::{AccessClaims, CommentContentRequest, CommentResponse, UserSummary};

use crate::error::{ApiError, parse_id, require_field};
use crate::guard::assert_owner;
use crate::middleware::require_auth;
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};
use crate::users::user_summary;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/get/{video_id}", get(comment_feed))
        .route("/add/{video_id}", post(add_comment))
        .route("/update/{comment_id}", patch(update_comment))
        .route("/delete/{comment_id}", delete(delete_comment))
        .layer(from_fn_with_state(state, require_auth))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

async fn comment_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "video")?.to_string();
    let page = Page::new(query.page, query.limit);
    let viewer = claims.sub.to_string();

    let feed = db_call(&state, move |db| {
        if db.get_video_by_id(&video_id)?.is_none() {
            return Ok(None);
        }
        db.comment_feed(&video_id, &viewer, page).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("video"))?;

    let feed = feed.map(|row| CommentResponse {
        id: parse_row_id(&row.id),
        content: row.content,
        created_at: parse_ts(&row.created_at),
        like_count: row.like_count as u64,
        is_liked: row.is_liked,
        owner: UserSummary {
            id: parse_row_id(&row.owner_id),
            username: row.owner_username,
            display_name: row.owner_display_name,
            avatar_url: row.owner_avatar_url,
        },
    });

    Ok(ApiOk::new(feed, "Comments fetched"))
}

async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(video_id): Path<String>,
    Json(req): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id(&video_id, "video")?.to_string();
    require_field(&req.content, "content")?;

    let comment_id = Uuid::new_v4().to_string();
    let owner_id = claims.sub.to_string();

    let (comment, owner) = {
        let comment_id = comment_id.clone();
        db_call(&state, move |db| {
            if db.get_video_by_id(&video_id)?.is_none() {
                return Ok(None);
            }
            db.create_comment(&comment_id, req.content.trim(), &video_id, &owner_id)?;
            let comment = db.get_comment_by_id(&comment_id)?;
            let owner = db.get_user_by_id(&owner_id)?;
            Ok(comment.zip(owner))
        })
        .await?
    }
    .ok_or(ApiError::NotFound("video"))?;

    Ok(ApiOk::created(
        CommentResponse {
            id: parse_row_id(&comment.id),
            content: comment.content,
            created_at: parse_ts(&comment.created_at),
            like_count: 0,
            is_liked: false,
            owner: user_summary(&owner),
        },
        "Comment added",
    ))
}

async fn update_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(comment_id): Path<String>,
    Json(req): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_id(&comment_id, "comment")?.to_string();
    require_field(&req.content, "content")?;
    let acting = claims.sub.to_string();

    let existing = {
        let comment_id = comment_id.clone();
        db_call(&state, move |db| db.get_comment_by_id(&comment_id)).await?
    };
    assert_owner(existing, |c| &c.owner_id, &acting, "comment")?;

    let (comment, owner, like_count, is_liked) = {
        let comment_id = comment_id.clone();
        db_call(&state, move |db| {
            db.update_comment_content(&comment_id, req.content.trim())?;
            let comment = db
                .get_comment_by_id(&comment_id)?
                .ok_or_else(|| anyhow::anyhow!("comment vanished mid-update"))?;
            let owner = db
                .get_user_by_id(&comment.owner_id)?
                .ok_or_else(|| anyhow::anyhow!("comment owner missing"))?;
            let like_count = db.count_likes(LikeTarget::Comment, &comment_id)?;
            let is_liked = db.count_likes_by(LikeTarget::Comment, &comment_id, &acting)? > 0;
            Ok((comment, owner, like_count, is_liked))
        })
        .await?
    };

    Ok(ApiOk::new(
        CommentResponse {
            id: parse_row_id(&comment.id),
            content: comment.content,
            created_at: parse_ts(&comment.created_at),
            like_count: like_count as u64,
            is_liked,
            owner: user_summary(&owner),
        },
        "Comment updated",
    ))
}

async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_id(&comment_id, "comment")?.to_string();

    let existing = {
        let comment_id = comment_id.clone();
        db_call(&state, move |db| db.get_comment_by_id(&comment_id)).await?
    };
    assert_owner(existing, |c| &c.owner_id, &claims.sub.to_string(), "comment")?;

    db_call(&state, move |db| db.delete_comment_cascade(&comment_id)).await?;

    Ok(ApiOk::new(serde_json::json!({}), "Comment deleted"))
}
