use crate::Database;
use crate::models::VideoRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

const VIDEO_COLUMNS: &str = "id, title, description, video_id, video_url, thumbnail_id, \
                             thumbnail_url, duration_seconds, views, is_published, owner_id, created_at";

fn video_from_row(row: &rusqlite::Row) -> rusqlite::Result<VideoRow> {
    Ok(VideoRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        video_id: row.get(3)?,
        video_url: row.get(4)?,
        thumbnail_id: row.get(5)?,
        thumbnail_url: row.get(6)?,
        duration_seconds: row.get(7)?,
        views: row.get(8)?,
        is_published: row.get(9)?,
        owner_id: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn create_video(
        &self,
        id: &str,
        title: &str,
        description: &str,
        video_asset_id: &str,
        video_url: &str,
        thumbnail_id: &str,
        thumbnail_url: &str,
        duration_seconds: f64,
        owner_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO videos (id, title, description, video_id, video_url, thumbnail_id, thumbnail_url, duration_seconds, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    title,
                    description,
                    video_asset_id,
                    video_url,
                    thumbnail_id,
                    thumbnail_url,
                    duration_seconds,
                    owner_id
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_video_by_id(&self, id: &str) -> Result<Option<VideoRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?1"),
                    [id],
                    video_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Metadata update plus optional asset replacement, one transaction.
    pub fn update_video(
        &self,
        id: &str,
        title: &str,
        description: &str,
        video_asset: Option<(&str, &str)>,
        thumbnail_asset: Option<(&str, &str)>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE videos SET title = ?1, description = ?2 WHERE id = ?3",
                params![title, description, id],
            )?;
            if let Some((asset_id, url)) = video_asset {
                tx.execute(
                    "UPDATE videos SET video_id = ?1, video_url = ?2 WHERE id = ?3",
                    params![asset_id, url, id],
                )?;
            }
            if let Some((asset_id, url)) = thumbnail_asset {
                tx.execute(
                    "UPDATE videos SET thumbnail_id = ?1, thumbnail_url = ?2 WHERE id = ?3",
                    params![asset_id, url, id],
                )?;
            }
            tx.commit()?;
            Ok(n > 0)
        })
    }

    pub fn set_publish_status(&self, id: &str, published: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE videos SET is_published = ?1 WHERE id = ?2",
                params![published, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Side effect of a successful detail fetch: bump the view counter
    /// and remember the video in the viewer's history. Two autocommit
    /// statements; each is atomic on its own, the pair is not.
    pub fn record_view(&self, video_id: &str, viewer_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE videos SET views = views + 1 WHERE id = ?1",
                [video_id],
            )?;
            conn.execute(
                "INSERT OR IGNORE INTO watch_history (user_id, video_id) VALUES (?1, ?2)",
                params![viewer_id, video_id],
            )?;
            Ok(())
        })
    }

    /// Deletes the video together with every row that references it:
    /// likes on the video, its comments (and likes on those comments),
    /// watch-history entries and playlist memberships. Foreign keys are
    /// on, so the dependent rows must go first; the whole sequence is
    /// one transaction.
    pub fn delete_video_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM likes WHERE video_id = ?1", [id])?;
            tx.execute(
                "DELETE FROM likes WHERE comment_id IN (SELECT id FROM comments WHERE video_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM comments WHERE video_id = ?1", [id])?;
            tx.execute("DELETE FROM watch_history WHERE video_id = ?1", [id])?;
            tx.execute("DELETE FROM playlist_videos WHERE video_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM videos WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }

    pub fn count_watch_history(&self, user_id: &str, video_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM watch_history WHERE user_id = ?1 AND video_id = ?2",
                params![user_id, video_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::likes::LikeTarget;
    use crate::testutil::{seed_comment, seed_user, seed_video, test_db};
    use uuid::Uuid;

    #[test]
    fn record_view_increments_but_history_is_a_set() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, &alice, "intro", true);

        db.record_view(&video, &bob).unwrap();
        db.record_view(&video, &bob).unwrap();
        db.record_view(&video, &bob).unwrap();

        let row = db.get_video_by_id(&video).unwrap().unwrap();
        assert_eq!(row.views, 3);
        assert_eq!(db.count_watch_history(&bob, &video).unwrap(), 1);
    }

    #[test]
    fn delete_video_cascades_to_likes_and_comments() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, &alice, "doomed", true);
        let comment = seed_comment(&db, &video, &bob, "nice");

        db.toggle_like(
            &Uuid::new_v4().to_string(),
            LikeTarget::Video,
            &video,
            &bob,
        )
        .unwrap();
        db.toggle_like(
            &Uuid::new_v4().to_string(),
            LikeTarget::Comment,
            &comment,
            &alice,
        )
        .unwrap();
        db.record_view(&video, &bob).unwrap();

        assert!(db.delete_video_cascade(&video).unwrap());

        assert!(db.get_video_by_id(&video).unwrap().is_none());
        assert!(db.get_comment_by_id(&comment).unwrap().is_none());
        assert_eq!(db.count_likes(LikeTarget::Video, &video).unwrap(), 0);
        assert_eq!(db.count_likes(LikeTarget::Comment, &comment).unwrap(), 0);
        assert_eq!(db.count_watch_history(&bob, &video).unwrap(), 0);
    }

    #[test]
    fn delete_missing_video_reports_false() {
        let db = test_db();
        assert!(!db.delete_video_cascade("no-such-id").unwrap());
    }
}
