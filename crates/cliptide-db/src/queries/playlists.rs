use crate::Database;
use crate::models::PlaylistRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

fn playlist_from_row(row: &rusqlite::Row) -> rusqlite::Result<PlaylistRow> {
    Ok(PlaylistRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Database {
    pub fn create_playlist(
        &self,
        id: &str,
        name: &str,
        description: &str,
        owner_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (id, name, description, owner_id) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, description, owner_id],
            )?;
            Ok(())
        })
    }

    pub fn get_playlist_by_id(&self, id: &str) -> Result<Option<PlaylistRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, description, owner_id, created_at, updated_at FROM playlists WHERE id = ?1",
                    [id],
                    playlist_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_playlist(&self, id: &str, name: &str, description: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE playlists SET name = ?1, description = ?2, updated_at = datetime('now') WHERE id = ?3",
                params![name, description, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_playlist_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM playlist_videos WHERE playlist_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM playlists WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }

    /// Ordered-set append: re-adding a member is a no-op, new members
    /// go to the end.
    pub fn add_video_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1 FROM playlist_videos WHERE playlist_id = ?1",
                params![playlist_id, video_id],
            )?;
            tx.execute(
                "UPDATE playlists SET updated_at = datetime('now') WHERE id = ?1",
                [playlist_id],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn remove_video_from_playlist(&self, playlist_id: &str, video_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                params![playlist_id, video_id],
            )?;
            tx.execute(
                "UPDATE playlists SET updated_at = datetime('now') WHERE id = ?1",
                [playlist_id],
            )?;
            tx.commit()?;
            Ok(n > 0)
        })
    }

    pub fn count_playlist_videos(&self, playlist_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM playlist_videos WHERE playlist_id = ?1",
                [playlist_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{seed_user, seed_video, test_db};
    use uuid::Uuid;

    #[test]
    fn members_are_an_ordered_set() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let v1 = seed_video(&db, &alice, "one", true);
        let v2 = seed_video(&db, &alice, "two", true);
        let playlist = Uuid::new_v4().to_string();
        db.create_playlist(&playlist, "favs", "the good ones", &alice)
            .unwrap();

        db.add_video_to_playlist(&playlist, &v1).unwrap();
        db.add_video_to_playlist(&playlist, &v2).unwrap();
        db.add_video_to_playlist(&playlist, &v1).unwrap(); // duplicate
        assert_eq!(db.count_playlist_videos(&playlist).unwrap(), 2);

        assert!(db.remove_video_from_playlist(&playlist, &v1).unwrap());
        assert!(!db.remove_video_from_playlist(&playlist, &v1).unwrap());
        assert_eq!(db.count_playlist_videos(&playlist).unwrap(), 1);
    }

    #[test]
    fn delete_playlist_removes_membership_rows() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let v1 = seed_video(&db, &alice, "one", true);
        let playlist = Uuid::new_v4().to_string();
        db.create_playlist(&playlist, "favs", "desc", &alice).unwrap();
        db.add_video_to_playlist(&playlist, &v1).unwrap();

        assert!(db.delete_playlist_cascade(&playlist).unwrap());
        assert!(db.get_playlist_by_id(&playlist).unwrap().is_none());
        assert_eq!(db.count_playlist_videos(&playlist).unwrap(), 0);
    }
}
