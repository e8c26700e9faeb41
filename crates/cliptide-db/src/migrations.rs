use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                TEXT PRIMARY KEY,
            username          TEXT NOT NULL UNIQUE,
            email             TEXT NOT NULL UNIQUE,
            display_name      TEXT NOT NULL,
            password          TEXT NOT NULL,
            avatar_id         TEXT NOT NULL,
            avatar_url        TEXT NOT NULL,
            cover_image_id    TEXT,
            cover_image_url   TEXT,
            refresh_token     TEXT,
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS videos (
            id                TEXT PRIMARY KEY,
            title             TEXT NOT NULL,
            description       TEXT NOT NULL,
            video_id          TEXT NOT NULL,
            video_url         TEXT NOT NULL,
            thumbnail_id      TEXT NOT NULL,
            thumbnail_url     TEXT NOT NULL,
            duration_seconds  REAL NOT NULL,
            views             INTEGER NOT NULL DEFAULT 0,
            is_published      INTEGER NOT NULL DEFAULT 0,
            owner_id          TEXT NOT NULL REFERENCES users(id),
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_videos_owner
            ON videos(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            content     TEXT NOT NULL,
            video_id    TEXT NOT NULL REFERENCES videos(id),
            owner_id    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_video
            ON comments(video_id, created_at);

        CREATE TABLE IF NOT EXISTS tweets (
            id          TEXT PRIMARY KEY,
            content     TEXT NOT NULL,
            author_id   TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tweets_author
            ON tweets(author_id, created_at);

        -- Exactly one target column is populated per like row. The
        -- partial unique indexes make the at-most-one-like-per-target
        -- invariant a store constraint instead of a check-then-act.
        CREATE TABLE IF NOT EXISTS likes (
            id          TEXT PRIMARY KEY,
            video_id    TEXT REFERENCES videos(id),
            comment_id  TEXT REFERENCES comments(id),
            tweet_id    TEXT REFERENCES tweets(id),
            liked_by    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (
                (video_id IS NOT NULL) + (comment_id IS NOT NULL) + (tweet_id IS NOT NULL) = 1
            )
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_video_once
            ON likes(liked_by, video_id) WHERE video_id IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_comment_once
            ON likes(liked_by, comment_id) WHERE comment_id IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_tweet_once
            ON likes(liked_by, tweet_id) WHERE tweet_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS subscriptions (
            id             TEXT PRIMARY KEY,
            subscriber_id  TEXT NOT NULL REFERENCES users(id),
            channel_id     TEXT NOT NULL REFERENCES users(id),
            created_at     TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(subscriber_id, channel_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_channel
            ON subscriptions(channel_id);

        -- Set semantics: a video appears in a user's history at most
        -- once, no matter how many times it is watched.
        CREATE TABLE IF NOT EXISTS watch_history (
            user_id     TEXT NOT NULL REFERENCES users(id),
            video_id    TEXT NOT NULL REFERENCES videos(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, video_id)
        );

        CREATE TABLE IF NOT EXISTS playlists (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT NOT NULL,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS playlist_videos (
            playlist_id TEXT NOT NULL REFERENCES playlists(id),
            video_id    TEXT NOT NULL REFERENCES videos(id),
            position    INTEGER NOT NULL,
            PRIMARY KEY (playlist_id, video_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
