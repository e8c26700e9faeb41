use crate::Database;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

/// Discriminated like target: exactly one of the three reference
/// columns on a like row is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    pub fn column(self) -> &'static str {
        match self {
            LikeTarget::Video => "video_id",
            LikeTarget::Comment => "comment_id",
            LikeTarget::Tweet => "tweet_id",
        }
    }
}

impl Database {
    /// Toggle a like: removes if present, inserts if not. Returns true
    /// when the row was inserted (the target is now liked). Find and
    /// flip run in one transaction; the partial unique indexes catch
    /// anything that slips past the check.
    pub fn toggle_like(
        &self,
        id: &str,
        target: LikeTarget,
        target_id: &str,
        liked_by: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let col = target.column();

            let existing: Option<String> = tx
                .query_row(
                    &format!("SELECT id FROM likes WHERE {col} = ?1 AND liked_by = ?2"),
                    params![target_id, liked_by],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if let Some(existing_id) = existing {
                tx.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                false
            } else {
                tx.execute(
                    &format!("INSERT INTO likes (id, {col}, liked_by) VALUES (?1, ?2, ?3)"),
                    params![id, target_id, liked_by],
                )?;
                true
            };

            tx.commit()?;
            Ok(liked)
        })
    }

    pub fn count_likes(&self, target: LikeTarget, target_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                &format!("SELECT COUNT(*) FROM likes WHERE {} = ?1", target.column()),
                [target_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn count_likes_by(
        &self,
        target: LikeTarget,
        target_id: &str,
        liked_by: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM likes WHERE {} = ?1 AND liked_by = ?2",
                    target.column()
                ),
                params![target_id, liked_by],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LikeTarget;
    use crate::testutil::{seed_tweet, seed_user, seed_video, test_db};
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn toggle_alternates_and_row_count_stays_bounded() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, &alice, "clip", true);

        assert!(
            db.toggle_like(&new_id(), LikeTarget::Video, &video, &bob)
                .unwrap()
        );
        assert_eq!(db.count_likes_by(LikeTarget::Video, &video, &bob).unwrap(), 1);

        assert!(
            !db.toggle_like(&new_id(), LikeTarget::Video, &video, &bob)
                .unwrap()
        );
        assert_eq!(db.count_likes_by(LikeTarget::Video, &video, &bob).unwrap(), 0);

        assert!(
            db.toggle_like(&new_id(), LikeTarget::Video, &video, &bob)
                .unwrap()
        );
        assert_eq!(db.count_likes_by(LikeTarget::Video, &video, &bob).unwrap(), 1);
    }

    #[test]
    fn targets_are_independent() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let video = seed_video(&db, &alice, "clip", true);
        let tweet = seed_tweet(&db, &alice, "hello");

        db.toggle_like(&new_id(), LikeTarget::Video, &video, &alice)
            .unwrap();
        db.toggle_like(&new_id(), LikeTarget::Tweet, &tweet, &alice)
            .unwrap();

        assert_eq!(db.count_likes(LikeTarget::Video, &video).unwrap(), 1);
        assert_eq!(db.count_likes(LikeTarget::Tweet, &tweet).unwrap(), 1);

        db.toggle_like(&new_id(), LikeTarget::Tweet, &tweet, &alice)
            .unwrap();
        assert_eq!(db.count_likes(LikeTarget::Video, &video).unwrap(), 1);
        assert_eq!(db.count_likes(LikeTarget::Tweet, &tweet).unwrap(), 0);
    }

    #[test]
    fn duplicate_insert_is_rejected_by_the_store() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let video = seed_video(&db, &alice, "clip", true);

        db.toggle_like(&new_id(), LikeTarget::Video, &video, &alice)
            .unwrap();

        // Bypass the toggle and try to force a second row for the same
        // (actor, target) pair: the partial unique index must reject it.
        let forced = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (id, video_id, liked_by) VALUES (?1, ?2, ?3)",
                rusqlite::params![Uuid::new_v4().to_string(), video, alice],
            )?;
            Ok(())
        });
        assert!(forced.is_err());
    }
}
