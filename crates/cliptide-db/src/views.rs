//! Relational views: joined, derived, viewer-relative projections
//! assembled on demand for responses. Each view is one SQL statement
//! (plus a count for paginated feeds): correlated subqueries compute
//! the counts and EXISTS the viewer flags, with plain JOINs standing
//! in for owner lookups.

use crate::Database;
use crate::models::{
    ChannelProfileRow, ChannelStatsRow, CommentFeedRow, DashboardVideoRow, LatestVideoRow,
    PlaylistDetailRow, PlaylistVideoRow, SubscribedChannelRow, SubscriberRow, TweetFeedRow,
    VideoDetailRow, VideoFeedRow, VideoListRow,
};
use crate::pagination::Page;
use anyhow::Result;
use cliptide_types::api::Paginated;
use rusqlite::{Connection, OptionalExtension, params, types::ToSql};

/// Sort keys accepted by the public video listing. The source applied
/// the client's `sortBy` string verbatim; a SQL build has to pin the
/// column names instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    CreatedAt,
    Views,
    Duration,
}

impl VideoSort {
    fn column(self) -> &'static str {
        match self {
            VideoSort::CreatedAt => "v.created_at",
            VideoSort::Views => "v.views",
            VideoSort::Duration => "v.duration_seconds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoListFilter {
    /// Case-insensitive substring match over title and description.
    pub query: Option<String>,
    pub owner_id: Option<String>,
    pub sort: VideoSort,
    pub direction: SortDirection,
}

impl Database {
    /// Channel profile by username: subscriber counts plus whether the
    /// acting viewer is subscribed.
    pub fn channel_profile(
        &self,
        username: &str,
        viewer_id: &str,
    ) -> Result<Option<ChannelProfileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT u.id, u.username, u.display_name, u.email, u.avatar_url, u.cover_image_url,
                            (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id),
                            (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id),
                            EXISTS(SELECT 1 FROM subscriptions s
                                   WHERE s.channel_id = u.id AND s.subscriber_id = ?2)
                     FROM users u
                     WHERE u.username = ?1",
                    params![username, viewer_id],
                    |row| {
                        Ok(ChannelProfileRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            display_name: row.get(2)?,
                            email: row.get(3)?,
                            avatar_url: row.get(4)?,
                            cover_image_url: row.get(5)?,
                            subscribers_count: row.get(6)?,
                            channel_subscribed_to_count: row.get(7)?,
                            is_subscribed: row.get(8)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Video detail: like stats for the viewer plus the owner enriched
    /// with channel stats relative to the same viewer. The view-count /
    /// watch-history side effect is a separate call (`record_view`),
    /// performed by the handler only after this read succeeds.
    pub fn video_detail(&self, video_id: &str, viewer_id: &str) -> Result<Option<VideoDetailRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT v.id, v.title, v.description, v.video_url, v.duration_seconds,
                            v.views, v.created_at,
                            (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id),
                            EXISTS(SELECT 1 FROM likes l
                                   WHERE l.video_id = v.id AND l.liked_by = ?2),
                            u.id, u.username, u.avatar_url,
                            (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id),
                            EXISTS(SELECT 1 FROM subscriptions s
                                   WHERE s.channel_id = u.id AND s.subscriber_id = ?2)
                     FROM videos v
                     JOIN users u ON u.id = v.owner_id
                     WHERE v.id = ?1",
                    params![video_id, viewer_id],
                    |row| {
                        Ok(VideoDetailRow {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            description: row.get(2)?,
                            video_url: row.get(3)?,
                            duration_seconds: row.get(4)?,
                            views: row.get(5)?,
                            created_at: row.get(6)?,
                            likes_count: row.get(7)?,
                            is_liked: row.get(8)?,
                            owner_id: row.get(9)?,
                            owner_username: row.get(10)?,
                            owner_avatar_url: row.get(11)?,
                            owner_subscribers_count: row.get(12)?,
                            owner_is_subscribed: row.get(13)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Public listing: published videos only, optional text and owner
    /// filters, whitelisted sort, count-then-slice pagination in one
    /// logical call.
    pub fn list_videos(
        &self,
        filter: &VideoListFilter,
        page: Page,
    ) -> Result<Paginated<VideoListRow>> {
        self.with_conn(|conn| {
            let mut clauses = vec!["v.is_published = 1".to_string()];
            let mut args: Vec<&dyn ToSql> = Vec::new();

            if let Some(q) = &filter.query {
                clauses.push(
                    "(v.title LIKE '%' || ? || '%' OR v.description LIKE '%' || ? || '%')"
                        .to_string(),
                );
                args.push(q);
                args.push(q);
            }
            if let Some(owner) = &filter.owner_id {
                clauses.push("v.owner_id = ?".to_string());
                args.push(owner);
            }
            let where_sql = clauses.join(" AND ");

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM videos v WHERE {where_sql}"),
                args.as_slice(),
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                        v.duration_seconds, v.views, v.created_at,
                        u.id, u.username, u.avatar_url
                 FROM videos v
                 JOIN users u ON u.id = v.owner_id
                 WHERE {where_sql}
                 ORDER BY {} {}, v.rowid DESC
                 LIMIT ? OFFSET ?",
                filter.sort.column(),
                filter.direction.keyword(),
            );
            let limit = i64::from(page.limit);
            let offset = page.offset();
            let mut sel_args = args.clone();
            sel_args.push(&limit);
            sel_args.push(&offset);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(sel_args.as_slice(), |row| {
                    Ok(VideoListRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        video_url: row.get(3)?,
                        thumbnail_url: row.get(4)?,
                        duration_seconds: row.get(5)?,
                        views: row.get(6)?,
                        created_at: row.get(7)?,
                        owner_id: row.get(8)?,
                        owner_username: row.get(9)?,
                        owner_avatar_url: row.get(10)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(page.wrap(rows, total))
        })
    }

    /// Comment feed for a video, newest first, paginated.
    pub fn comment_feed(
        &self,
        video_id: &str,
        viewer_id: &str,
        page: Page,
    ) -> Result<Paginated<CommentFeedRow>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE video_id = ?1",
                [video_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(
                "SELECT c.id, c.content, c.created_at,
                        (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id),
                        EXISTS(SELECT 1 FROM likes l
                               WHERE l.comment_id = c.id AND l.liked_by = ?2),
                        u.id, u.username, u.display_name, u.avatar_url
                 FROM comments c
                 JOIN users u ON u.id = c.owner_id
                 WHERE c.video_id = ?1
                 ORDER BY c.created_at DESC, c.rowid DESC
                 LIMIT ?3 OFFSET ?4",
            )?;
            let rows = stmt
                .query_map(
                    params![video_id, viewer_id, i64::from(page.limit), page.offset()],
                    |row| {
                        Ok(CommentFeedRow {
                            id: row.get(0)?,
                            content: row.get(1)?,
                            created_at: row.get(2)?,
                            like_count: row.get(3)?,
                            is_liked: row.get(4)?,
                            owner_id: row.get(5)?,
                            owner_username: row.get(6)?,
                            owner_display_name: row.get(7)?,
                            owner_avatar_url: row.get(8)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(page.wrap(rows, total))
        })
    }

    /// All tweets by one author, newest first, like stats relative to
    /// the viewer.
    pub fn tweet_feed(&self, author_id: &str, viewer_id: &str) -> Result<Vec<TweetFeedRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.content, t.created_at,
                        (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id),
                        EXISTS(SELECT 1 FROM likes l
                               WHERE l.tweet_id = t.id AND l.liked_by = ?2),
                        u.id, u.username, u.display_name, u.avatar_url
                 FROM tweets t
                 JOIN users u ON u.id = t.author_id
                 WHERE t.author_id = ?1
                 ORDER BY t.created_at DESC, t.rowid DESC",
            )?;
            let rows = stmt
                .query_map(params![author_id, viewer_id], |row| {
                    Ok(TweetFeedRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        created_at: row.get(2)?,
                        likes_count: row.get(3)?,
                        is_liked: row.get(4)?,
                        owner_id: row.get(5)?,
                        owner_username: row.get(6)?,
                        owner_display_name: row.get(7)?,
                        owner_avatar_url: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Subscribers of a channel, each with their own subscriber count
    /// and the mutual-follow flag (does the channel follow them back).
    pub fn subscriber_list(&self, channel_id: &str) -> Result<Vec<SubscriberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.display_name, u.avatar_url,
                        (SELECT COUNT(*) FROM subscriptions s2 WHERE s2.channel_id = u.id),
                        EXISTS(SELECT 1 FROM subscriptions s3
                               WHERE s3.channel_id = u.id AND s3.subscriber_id = ?1)
                 FROM subscriptions s
                 JOIN users u ON u.id = s.subscriber_id
                 WHERE s.channel_id = ?1
                 ORDER BY s.created_at DESC, s.rowid DESC",
            )?;
            let rows = stmt
                .query_map([channel_id], |row| {
                    Ok(SubscriberRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get(2)?,
                        avatar_url: row.get(3)?,
                        subscribers_count: row.get(4)?,
                        subscribed_to_subscriber: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Channels a user follows, each joined with its most recent
    /// published video.
    pub fn subscribed_channels(&self, subscriber_id: &str) -> Result<Vec<SubscribedChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.display_name, u.avatar_url,
                        v.id, v.title, v.thumbnail_url, v.views, v.created_at
                 FROM subscriptions s
                 JOIN users u ON u.id = s.channel_id
                 LEFT JOIN videos v ON v.id = (
                     SELECT v2.id FROM videos v2
                     WHERE v2.owner_id = u.id AND v2.is_published = 1
                     ORDER BY v2.created_at DESC, v2.rowid DESC
                     LIMIT 1
                 )
                 WHERE s.subscriber_id = ?1
                 ORDER BY s.created_at DESC, s.rowid DESC",
            )?;
            let rows = stmt
                .query_map([subscriber_id], |row| {
                    let latest_id: Option<String> = row.get(4)?;
                    let latest_video = match latest_id {
                        Some(id) => Some(LatestVideoRow {
                            id,
                            title: row.get(5)?,
                            thumbnail_url: row.get(6)?,
                            views: row.get(7)?,
                            created_at: row.get(8)?,
                        }),
                        None => None,
                    };
                    Ok(SubscribedChannelRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get(2)?,
                        avatar_url: row.get(3)?,
                        latest_video,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Playlist with owner and members. The detail view hides
    /// unpublished members and computes totals over the visible ones
    /// only; the per-user listing keeps every member (source
    /// behaviour).
    pub fn playlist_detail(&self, playlist_id: &str) -> Result<Option<PlaylistDetailRow>> {
        self.with_conn(|conn| {
            let Some(mut detail) = query_playlist_header(conn, playlist_id, true)? else {
                return Ok(None);
            };
            detail.videos = query_playlist_videos(conn, playlist_id, true)?;
            Ok(Some(detail))
        })
    }

    pub fn user_playlists(&self, owner_id: &str) -> Result<Vec<PlaylistDetailRow>> {
        self.with_conn(|conn| {
            let ids: Vec<String> = conn
                .prepare(
                    "SELECT id FROM playlists WHERE owner_id = ?1
                     ORDER BY updated_at DESC, rowid DESC",
                )?
                .query_map([owner_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut out = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(mut detail) = query_playlist_header(conn, &id, false)? {
                    detail.videos = query_playlist_videos(conn, &id, false)?;
                    out.push(detail);
                }
            }
            Ok(out)
        })
    }

    /// Watch history in insertion order, videos joined with their
    /// owners.
    pub fn watch_history(&self, user_id: &str) -> Result<Vec<VideoFeedRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                        v.duration_seconds, v.views, v.created_at,
                        u.id, u.username, u.display_name, u.avatar_url
                 FROM watch_history wh
                 JOIN videos v ON v.id = wh.video_id
                 JOIN users u ON u.id = v.owner_id
                 WHERE wh.user_id = ?1
                 ORDER BY wh.created_at ASC, wh.rowid ASC",
            )?;
            let rows = stmt
                .query_map([user_id], video_feed_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every video the user has liked, newest like first.
    pub fn liked_videos(&self, liker_id: &str) -> Result<Vec<VideoFeedRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                        v.duration_seconds, v.views, v.created_at,
                        u.id, u.username, u.display_name, u.avatar_url
                 FROM likes l
                 JOIN videos v ON v.id = l.video_id
                 JOIN users u ON u.id = v.owner_id
                 WHERE l.liked_by = ?1 AND l.video_id IS NOT NULL
                 ORDER BY l.created_at DESC, l.rowid DESC",
            )?;
            let rows = stmt
                .query_map([liker_id], video_feed_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Dashboard aggregates for the acting user's own channel.
    pub fn channel_stats(&self, owner_id: &str) -> Result<ChannelStatsRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1),
                    (SELECT COUNT(*) FROM videos WHERE owner_id = ?1),
                    (SELECT COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?1),
                    (SELECT COUNT(*) FROM likes l
                     JOIN videos v ON v.id = l.video_id
                     WHERE v.owner_id = ?1)",
                [owner_id],
                |row| {
                    Ok(ChannelStatsRow {
                        total_subscribers: row.get(0)?,
                        total_videos: row.get(1)?,
                        total_views: row.get(2)?,
                        total_likes: row.get(3)?,
                    })
                },
            )?;
            Ok(row)
        })
    }

    /// The acting user's own uploads, published or not, with like
    /// counts, newest first.
    pub fn dashboard_videos(&self, owner_id: &str) -> Result<Vec<DashboardVideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.id, v.title, v.description, v.thumbnail_url, v.is_published,
                        (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id),
                        v.views, v.created_at
                 FROM videos v
                 WHERE v.owner_id = ?1
                 ORDER BY v.created_at DESC, v.rowid DESC",
            )?;
            let rows = stmt
                .query_map([owner_id], |row| {
                    Ok(DashboardVideoRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        thumbnail_url: row.get(3)?,
                        is_published: row.get(4)?,
                        likes_count: row.get(5)?,
                        views: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn video_feed_from_row(row: &rusqlite::Row) -> rusqlite::Result<VideoFeedRow> {
    Ok(VideoFeedRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        video_url: row.get(3)?,
        thumbnail_url: row.get(4)?,
        duration_seconds: row.get(5)?,
        views: row.get(6)?,
        created_at: row.get(7)?,
        owner_id: row.get(8)?,
        owner_username: row.get(9)?,
        owner_display_name: row.get(10)?,
        owner_avatar_url: row.get(11)?,
    })
}

fn query_playlist_header(
    conn: &Connection,
    playlist_id: &str,
    published_only: bool,
) -> Result<Option<PlaylistDetailRow>> {
    let member_filter = if published_only {
        "AND v.is_published = 1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
                (SELECT COUNT(*) FROM playlist_videos pv
                 JOIN videos v ON v.id = pv.video_id
                 WHERE pv.playlist_id = p.id {member_filter}),
                (SELECT COALESCE(SUM(v.views), 0) FROM playlist_videos pv
                 JOIN videos v ON v.id = pv.video_id
                 WHERE pv.playlist_id = p.id {member_filter}),
                u.id, u.username, u.display_name, u.avatar_url
         FROM playlists p
         JOIN users u ON u.id = p.owner_id
         WHERE p.id = ?1"
    );
    let row = conn
        .query_row(&sql, [playlist_id], |row| {
            Ok(PlaylistDetailRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
                total_videos: row.get(5)?,
                total_views: row.get(6)?,
                owner_id: row.get(7)?,
                owner_username: row.get(8)?,
                owner_display_name: row.get(9)?,
                owner_avatar_url: row.get(10)?,
                videos: Vec::new(),
            })
        })
        .optional()?;
    Ok(row)
}

fn query_playlist_videos(
    conn: &Connection,
    playlist_id: &str,
    published_only: bool,
) -> Result<Vec<PlaylistVideoRow>> {
    let member_filter = if published_only {
        "AND v.is_published = 1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                v.duration_seconds, v.views, v.created_at
         FROM playlist_videos pv
         JOIN videos v ON v.id = pv.video_id
         WHERE pv.playlist_id = ?1 {member_filter}
         ORDER BY pv.position ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([playlist_id], |row| {
            Ok(PlaylistVideoRow {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                video_url: row.get(3)?,
                thumbnail_url: row.get(4)?,
                duration_seconds: row.get(5)?,
                views: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::{SortDirection, VideoListFilter, VideoSort};
    use crate::pagination::Page;
    use crate::queries::likes::LikeTarget;
    use crate::testutil::{seed_comment, seed_tweet, seed_user, seed_video, test_db};
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn channel_profile_counts_and_viewer_flag() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        // bob and carol follow alice; alice follows carol
        db.toggle_subscription(&new_id(), &bob, &alice).unwrap();
        db.toggle_subscription(&new_id(), &carol, &alice).unwrap();
        db.toggle_subscription(&new_id(), &alice, &carol).unwrap();

        let profile = db.channel_profile("alice", &bob).unwrap().unwrap();
        assert_eq!(profile.subscribers_count, 2);
        assert_eq!(profile.channel_subscribed_to_count, 1);
        assert!(profile.is_subscribed);

        let profile = db.channel_profile("alice", &alice).unwrap().unwrap();
        assert!(!profile.is_subscribed);

        assert!(db.channel_profile("nobody", &bob).unwrap().is_none());
    }

    #[test]
    fn video_detail_is_viewer_relative() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");
        let video = seed_video(&db, &alice, "launch", true);

        db.toggle_like(&new_id(), LikeTarget::Video, &video, &bob)
            .unwrap();
        db.toggle_subscription(&new_id(), &bob, &alice).unwrap();

        let for_bob = db.video_detail(&video, &bob).unwrap().unwrap();
        assert_eq!(for_bob.likes_count, 1);
        assert!(for_bob.is_liked);
        assert_eq!(for_bob.owner_username, "alice");
        assert_eq!(for_bob.owner_subscribers_count, 1);
        assert!(for_bob.owner_is_subscribed);

        let for_carol = db.video_detail(&video, &carol).unwrap().unwrap();
        assert_eq!(for_carol.likes_count, 1);
        assert!(!for_carol.is_liked);
        assert!(!for_carol.owner_is_subscribed);

        assert!(db.video_detail(&new_id(), &bob).unwrap().is_none());
    }

    #[test]
    fn listing_hides_unpublished_until_toggled() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let video = seed_video(&db, &alice, "hidden gem", false);

        let out = db
            .list_videos(&VideoListFilter::default(), Page::default())
            .unwrap();
        assert!(out.items.is_empty());
        assert_eq!(out.total_items, 0);

        db.set_publish_status(&video, true).unwrap();
        let out = db
            .list_videos(&VideoListFilter::default(), Page::default())
            .unwrap();
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].title, "hidden gem");
        assert_eq!(out.items[0].owner_username, "alice");
    }

    #[test]
    fn listing_filters_and_sorts() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let rust_talk = seed_video(&db, &alice, "Rust talk", true);
        let cooking = seed_video(&db, &alice, "cooking stream", true);
        seed_video(&db, &bob, "bob rust demo", true);

        // substring match is case-insensitive
        let filter = VideoListFilter {
            query: Some("RUST".into()),
            ..Default::default()
        };
        let out = db.list_videos(&filter, Page::default()).unwrap();
        assert_eq!(out.total_items, 2);

        let filter = VideoListFilter {
            query: Some("rust".into()),
            owner_id: Some(alice.clone()),
            ..Default::default()
        };
        let out = db.list_videos(&filter, Page::default()).unwrap();
        assert_eq!(out.total_items, 1);
        assert_eq!(out.items[0].id, rust_talk);

        // most viewed first
        for _ in 0..3 {
            db.record_view(&cooking, &bob).unwrap();
        }
        let filter = VideoListFilter {
            owner_id: Some(alice.clone()),
            sort: VideoSort::Views,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        let out = db.list_videos(&filter, Page::default()).unwrap();
        assert_eq!(out.items[0].id, cooking);
    }

    #[test]
    fn listing_pagination_boundaries() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        for i in 0..7 {
            seed_video(&db, &alice, &format!("video {i}"), true);
        }

        let page2 = db
            .list_videos(&VideoListFilter::default(), Page::new(Some(2), Some(3)))
            .unwrap();
        assert_eq!(page2.items.len(), 3);
        assert_eq!(page2.total_items, 7);
        assert_eq!(page2.total_pages, 3);

        // last page carries the remainder
        let page3 = db
            .list_videos(&VideoListFilter::default(), Page::new(Some(3), Some(3)))
            .unwrap();
        assert_eq!(page3.items.len(), 1);

        // past the end: empty items, real total, no error
        let beyond = db
            .list_videos(&VideoListFilter::default(), Page::new(Some(9), Some(3)))
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_items, 7);
    }

    #[test]
    fn comment_feed_joins_owner_and_paginates() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, &alice, "clip", true);
        for i in 0..5 {
            seed_comment(&db, &video, &bob, &format!("comment {i}"));
        }
        let liked = seed_comment(&db, &video, &alice, "pinned");
        db.toggle_like(&new_id(), LikeTarget::Comment, &liked, &bob)
            .unwrap();

        let page1 = db.comment_feed(&video, &bob, Page::new(Some(1), Some(4))).unwrap();
        assert_eq!(page1.items.len(), 4);
        assert_eq!(page1.total_items, 6);
        assert_eq!(page1.total_pages, 2);
        // newest first: the liked comment was added last
        assert_eq!(page1.items[0].content, "pinned");
        assert_eq!(page1.items[0].like_count, 1);
        assert!(page1.items[0].is_liked);
        assert_eq!(page1.items[0].owner_username, "alice");

        let page2 = db.comment_feed(&video, &bob, Page::new(Some(2), Some(4))).unwrap();
        assert_eq!(page2.items.len(), 2);

        let beyond = db.comment_feed(&video, &bob, Page::new(Some(5), Some(4))).unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_items, 6);
    }

    #[test]
    fn tweet_feed_counts_likes_per_viewer() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let tweet = seed_tweet(&db, &alice, "good morning");
        db.toggle_like(&new_id(), LikeTarget::Tweet, &tweet, &bob)
            .unwrap();

        let for_bob = db.tweet_feed(&alice, &bob).unwrap();
        assert_eq!(for_bob.len(), 1);
        assert_eq!(for_bob[0].likes_count, 1);
        assert!(for_bob[0].is_liked);
        assert_eq!(for_bob[0].owner_username, "alice");

        let for_alice = db.tweet_feed(&alice, &alice).unwrap();
        assert!(!for_alice[0].is_liked);
    }

    #[test]
    fn subscriber_list_reports_mutuals() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        db.toggle_subscription(&new_id(), &bob, &alice).unwrap();
        db.toggle_subscription(&new_id(), &carol, &alice).unwrap();
        db.toggle_subscription(&new_id(), &alice, &bob).unwrap(); // mutual with bob
        db.toggle_subscription(&new_id(), &carol, &bob).unwrap();

        let subs = db.subscriber_list(&alice).unwrap();
        assert_eq!(subs.len(), 2);

        let bob_entry = subs.iter().find(|s| s.username == "bob").unwrap();
        assert!(bob_entry.subscribed_to_subscriber);
        assert_eq!(bob_entry.subscribers_count, 2); // alice + carol

        let carol_entry = subs.iter().find(|s| s.username == "carol").unwrap();
        assert!(!carol_entry.subscribed_to_subscriber);
        assert_eq!(carol_entry.subscribers_count, 0);
    }

    #[test]
    fn subscribed_channels_carry_latest_published_video() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        db.toggle_subscription(&new_id(), &carol, &alice).unwrap();
        db.toggle_subscription(&new_id(), &carol, &bob).unwrap();

        seed_video(&db, &alice, "draft", false); // unpublished, never surfaces
        let out = db.subscribed_channels(&carol).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.latest_video.is_none()));

        let published = seed_video(&db, &alice, "v1", true);
        let out = db.subscribed_channels(&carol).unwrap();
        let alice_entry = out.iter().find(|c| c.username == "alice").unwrap();
        assert_eq!(
            alice_entry.latest_video.as_ref().map(|v| v.id.as_str()),
            Some(published.as_str())
        );
        let bob_entry = out.iter().find(|c| c.username == "bob").unwrap();
        assert!(bob_entry.latest_video.is_none());
    }

    #[test]
    fn playlist_detail_hides_unpublished_members() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let shown = seed_video(&db, &alice, "public", true);
        let hidden = seed_video(&db, &alice, "draft", false);
        for _ in 0..4 {
            db.record_view(&shown, &bob).unwrap();
        }

        let playlist = new_id();
        db.create_playlist(&playlist, "mix", "assorted", &alice).unwrap();
        db.add_video_to_playlist(&playlist, &shown).unwrap();
        db.add_video_to_playlist(&playlist, &hidden).unwrap();

        let detail = db.playlist_detail(&playlist).unwrap().unwrap();
        assert_eq!(detail.total_videos, 1);
        assert_eq!(detail.total_views, 4);
        assert_eq!(detail.videos.len(), 1);
        assert_eq!(detail.videos[0].id, shown);
        assert_eq!(detail.owner_username, "alice");

        // the per-user listing keeps every member
        let listed = db.user_playlists(&alice).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].total_videos, 2);
        assert_eq!(listed[0].videos.len(), 2);
    }

    #[test]
    fn watch_history_keeps_insertion_order() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let v1 = seed_video(&db, &alice, "first", true);
        let v2 = seed_video(&db, &alice, "second", true);

        db.record_view(&v1, &bob).unwrap();
        db.record_view(&v2, &bob).unwrap();
        db.record_view(&v1, &bob).unwrap(); // re-watch, no reorder

        let history = db.watch_history(&bob).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, v1);
        assert_eq!(history[1].id, v2);
        assert_eq!(history[0].owner_username, "alice");
    }

    #[test]
    fn liked_videos_feed() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let v1 = seed_video(&db, &alice, "first", true);
        let v2 = seed_video(&db, &alice, "second", true);

        db.toggle_like(&new_id(), LikeTarget::Video, &v1, &bob).unwrap();
        db.toggle_like(&new_id(), LikeTarget::Video, &v2, &bob).unwrap();
        db.toggle_like(&new_id(), LikeTarget::Video, &v1, &bob).unwrap(); // unliked again

        let liked = db.liked_videos(&bob).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, v2);
    }

    #[test]
    fn channel_stats_aggregate_over_all_uploads() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");
        let v1 = seed_video(&db, &alice, "one", true);
        let v2 = seed_video(&db, &alice, "two", false);

        db.toggle_subscription(&new_id(), &bob, &alice).unwrap();
        db.toggle_subscription(&new_id(), &carol, &alice).unwrap();
        db.toggle_like(&new_id(), LikeTarget::Video, &v1, &bob).unwrap();
        db.toggle_like(&new_id(), LikeTarget::Video, &v1, &carol).unwrap();
        db.toggle_like(&new_id(), LikeTarget::Video, &v2, &bob).unwrap();
        db.record_view(&v1, &bob).unwrap();
        db.record_view(&v1, &carol).unwrap();

        let stats = db.channel_stats(&alice).unwrap();
        assert_eq!(stats.total_subscribers, 2);
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.total_views, 2);
        assert_eq!(stats.total_likes, 3);

        let empty = db.channel_stats(&bob).unwrap();
        assert_eq!(empty.total_subscribers, 0);
        assert_eq!(empty.total_videos, 0);
    }

    #[test]
    fn dashboard_videos_include_unpublished() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let v1 = seed_video(&db, &alice, "public", true);
        seed_video(&db, &alice, "draft", false);
        db.toggle_like(&new_id(), LikeTarget::Video, &v1, &bob).unwrap();

        let videos = db.dashboard_videos(&alice).unwrap();
        assert_eq!(videos.len(), 2);
        let published = videos.iter().find(|v| v.title == "public").unwrap();
        assert!(published.is_published);
        assert_eq!(published.likes_count, 1);
        let draft = videos.iter().find(|v| v.title == "draft").unwrap();
        assert!(!draft.is_published);
    }
}
