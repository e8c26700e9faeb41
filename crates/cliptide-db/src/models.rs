use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; fall back to the epoch on corrupt
/// data rather than failing the whole response.
pub fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

// -- Base rows --

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub avatar_id: String,
    pub avatar_url: String,
    pub cover_image_id: Option<String>,
    pub cover_image_url: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct VideoRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_id: String,
    pub video_url: String,
    pub thumbnail_id: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TweetRow {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PlaylistRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

// -- View rows (joined / derived projections, never persisted) --

#[derive(Debug)]
pub struct ChannelProfileRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub channel_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

#[derive(Debug)]
pub struct VideoDetailRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub created_at: String,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_avatar_url: String,
    pub owner_subscribers_count: i64,
    pub owner_is_subscribed: bool,
}

#[derive(Debug)]
pub struct VideoListRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub created_at: String,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_avatar_url: String,
}

#[derive(Debug)]
pub struct CommentFeedRow {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub like_count: i64,
    pub is_liked: bool,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar_url: String,
}

#[derive(Debug)]
pub struct TweetFeedRow {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar_url: String,
}

#[derive(Debug)]
pub struct SubscriberRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub subscribers_count: i64,
    pub subscribed_to_subscriber: bool,
}

#[derive(Debug)]
pub struct LatestVideoRow {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub views: i64,
    pub created_at: String,
}

#[derive(Debug)]
pub struct SubscribedChannelRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub latest_video: Option<LatestVideoRow>,
}

/// Video joined with its owner, for the watch-history and liked-videos
/// feeds.
#[derive(Debug)]
pub struct VideoFeedRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub created_at: String,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar_url: String,
}

#[derive(Debug)]
pub struct PlaylistVideoRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub created_at: String,
}

#[derive(Debug)]
pub struct PlaylistDetailRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub total_videos: i64,
    pub total_views: i64,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar_url: String,
    pub videos: Vec<PlaylistVideoRow>,
}

#[derive(Debug)]
pub struct ChannelStatsRow {
    pub total_subscribers: i64,
    pub total_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
}

#[derive(Debug)]
pub struct DashboardVideoRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub is_published: bool,
    pub likes_count: i64,
    pub views: i64,
    pub created_at: String,
}
