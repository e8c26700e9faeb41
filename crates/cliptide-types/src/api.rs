use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Claims carried by the short-lived access token. Canonical definition
/// lives here in cliptide-types so the REST middleware and the token
/// mint/verify helpers share one struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub exp: usize,
}

/// Claims carried by the long-lived refresh token. Only the subject;
/// the stored copy on the user row is what authorises rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: usize,
}

// -- Pagination --

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

// -- Auth / users --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    /// Id of a previously staged avatar asset. Required.
    pub avatar_asset_id: String,
    pub cover_image_asset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDetailsRequest {
    pub display_name: String,
    pub email: String,
}

/// Avatar / cover image replacement: the new blob is staged first, then
/// referenced here by id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAssetRequest {
    pub asset_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscribers_count: u64,
    pub channel_subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// Minimal owner/author projection used by comment, tweet, playlist and
/// feed responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

// -- Videos --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublishVideoRequest {
    pub title: String,
    pub description: String,
    pub duration_seconds: f64,
    pub video_asset_id: String,
    pub thumbnail_asset_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateVideoRequest {
    pub title: String,
    pub description: String,
    pub video_asset_id: Option<String>,
    pub thumbnail_asset_id: Option<String>,
}

/// Full video row, returned by publish/update mutations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: u64,
    pub is_published: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListOwner {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub owner: VideoListOwner,
}

/// Owner block of the video detail view: channel stats relative to the
/// acting viewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOwner {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: String,
    pub subscribers_count: u64,
    pub is_subscribed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration_seconds: f64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub likes_count: u64,
    pub is_liked: bool,
    pub owner: ChannelOwner,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishToggleResponse {
    pub is_published: bool,
}

/// Video joined with its owner, used by the watch-history and
/// liked-videos feeds.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeedItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommentContentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    pub is_liked: bool,
    pub owner: UserSummary,
}

// -- Tweets --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TweetContentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: u64,
    pub is_liked: bool,
    pub owner: UserSummary,
}

// -- Likes / subscriptions --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeToggleResponse {
    pub subscribed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub subscribers_count: u64,
    /// Mutual-follow flag: does the channel being inspected itself
    /// subscribe to this subscriber.
    pub subscribed_to_subscriber: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannelResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub latest_video: Option<LatestVideo>,
}

// -- Playlists --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaylistRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_videos: u64,
    pub total_views: u64,
    pub videos: Vec<PlaylistVideo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
}

// -- Dashboard --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatsResponse {
    pub total_subscribers: u64,
    pub total_videos: u64,
    pub total_views: u64,
    pub total_likes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardVideoItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub is_published: bool,
    pub likes_count: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}
