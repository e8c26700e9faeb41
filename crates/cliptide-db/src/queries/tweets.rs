use crate::Database;
use crate::models::TweetRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

fn tweet_from_row(row: &rusqlite::Row) -> rusqlite::Result<TweetRow> {
    Ok(TweetRow {
        id: row.get(0)?,
        content: row.get(1)?,
        author_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    pub fn create_tweet(&self, id: &str, content: &str, author_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, content, author_id) VALUES (?1, ?2, ?3)",
                params![id, content, author_id],
            )?;
            Ok(())
        })
    }

    pub fn get_tweet_by_id(&self, id: &str) -> Result<Option<TweetRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, content, author_id, created_at FROM tweets WHERE id = ?1",
                    [id],
                    tweet_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_tweet_content(&self, id: &str, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE tweets SET content = ?1 WHERE id = ?2",
                params![content, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Like rows referencing the tweet go first; foreign keys are on.
    pub fn delete_tweet_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM likes WHERE tweet_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM tweets WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::likes::LikeTarget;
    use crate::testutil::{seed_tweet, seed_user, test_db};
    use uuid::Uuid;

    #[test]
    fn delete_tweet_removes_its_likes() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let tweet = seed_tweet(&db, &alice, "shipping today");

        db.toggle_like(&Uuid::new_v4().to_string(), LikeTarget::Tweet, &tweet, &bob)
            .unwrap();

        assert!(db.delete_tweet_cascade(&tweet).unwrap());
        assert!(db.get_tweet_by_id(&tweet).unwrap().is_none());
        assert_eq!(db.count_likes(LikeTarget::Tweet, &tweet).unwrap(), 0);
    }
}
