use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, patch, post},
};
use uuid::Uuid;

use cliptide_db::models::parse_ts;
use cliptide_db::queries::likes::LikeTarget;
use cliptide_types::api::{AccessClaims, TweetContentRequest, TweetResponse};

use crate::error::{ApiError, parse_id, require_field};
use crate::guard::assert_owner;
use crate::middleware::require_auth;
use crate::response::{ApiOk, parse_row_id};
use crate::state::{AppState, db_call};
use crate::users::user_summary;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{user_id}", get(user_tweets))
        .route("/{tweet_id}", patch(update_tweet).delete(delete_tweet))
        .layer(from_fn_with_state(state, require_auth))
}

async fn create_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field(&req.content, "content")?;

    let tweet_id = Uuid::new_v4().to_string();
    let author_id = claims.sub.to_string();

    let (tweet, author) = {
        let tweet_id = tweet_id.clone();
        db_call(&state, move |db| {
            db.create_tweet(&tweet_id, req.content.trim(), &author_id)?;
            let tweet = db
                .get_tweet_by_id(&tweet_id)?
                .ok_or_else(|| anyhow::anyhow!("tweet row missing after insert"))?;
            let author = db
                .get_user_by_id(&author_id)?
                .ok_or_else(|| anyhow::anyhow!("tweet author missing"))?;
            Ok((tweet, author))
        })
        .await?
    };

    Ok(ApiOk::created(
        TweetResponse {
            id: parse_row_id(&tweet.id),
            content: tweet.content,
            created_at: parse_ts(&tweet.created_at),
            likes_count: 0,
            is_liked: false,
            owner: user_summary(&author),
        },
        "Tweet created",
    ))
}

async fn user_tweets(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let author_id = parse_id(&user_id, "user")?.to_string();
    let viewer = claims.sub.to_string();

    let rows = db_call(&state, move |db| db.tweet_feed(&author_id, &viewer)).await?;

    let tweets: Vec<TweetResponse> = rows
        .into_iter()
        .map(|row| TweetResponse {
            id: parse_row_id(&row.id),
            content: row.content,
            created_at: parse_ts(&row.created_at),
            likes_count: row.likes_count as u64,
            is_liked: row.is_liked,
            owner: cliptide_types::api::UserSummary {
                id: parse_row_id(&row.owner_id),
                username: row.owner_username,
                display_name: row.owner_display_name,
                avatar_url: row.owner_avatar_url,
            },
        })
        .collect();

    Ok(ApiOk::new(tweets, "Tweets fetched"))
}

async fn update_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(tweet_id): Path<String>,
    Json(req): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?.to_string();
    require_field(&req.content, "content")?;
    let acting = claims.sub.to_string();

    let existing = {
        let tweet_id = tweet_id.clone();
        db_call(&state, move |db| db.get_tweet_by_id(&tweet_id)).await?
    };
    assert_owner(existing, |t| &t.author_id, &acting, "tweet")?;

    let (tweet, author, likes_count, is_liked) = {
        let tweet_id = tweet_id.clone();
        db_call(&state, move |db| {
            db.update_tweet_content(&tweet_id, req.content.trim())?;
            let tweet = db
                .get_tweet_by_id(&tweet_id)?
                .ok_or_else(|| anyhow::anyhow!("tweet vanished mid-update"))?;
            let author = db
                .get_user_by_id(&tweet.author_id)?
                .ok_or_else(|| anyhow::anyhow!("tweet author missing"))?;
            let likes_count = db.count_likes(LikeTarget::Tweet, &tweet_id)?;
            let is_liked = db.count_likes_by(LikeTarget::Tweet, &tweet_id, &acting)? > 0;
            Ok((tweet, author, likes_count, is_liked))
        })
        .await?
    };

    Ok(ApiOk::new(
        TweetResponse {
            id: parse_row_id(&tweet.id),
            content: tweet.content,
            created_at: parse_ts(&tweet.created_at),
            likes_count: likes_count as u64,
            is_liked,
            owner: user_summary(&author),
        },
        "Tweet updated",
    ))
}

async fn delete_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?.to_string();

    let existing = {
        let tweet_id = tweet_id.clone();
        db_call(&state, move |db| db.get_tweet_by_id(&tweet_id)).await?
    };
    assert_owner(existing, |t| &t.author_id, &claims.sub.to_string(), "tweet")?;

    db_call(&state, move |db| db.delete_tweet_cascade(&tweet_id)).await?;

    Ok(ApiOk::new(serde_json::json!({}), "Tweet deleted"))
}
