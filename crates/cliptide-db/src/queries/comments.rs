use crate::Database;
use crate::models::CommentRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

fn comment_from_row(row: &rusqlite::Row) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        content: row.get(1)?,
        video_id: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    pub fn create_comment(
        &self,
        id: &str,
        content: &str,
        video_id: &str,
        owner_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, content, video_id, owner_id) VALUES (?1, ?2, ?3, ?4)",
                params![id, content, video_id, owner_id],
            )?;
            Ok(())
        })
    }

    pub fn get_comment_by_id(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, content, video_id, owner_id, created_at FROM comments WHERE id = ?1",
                    [id],
                    comment_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_comment_content(&self, id: &str, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                params![content, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Deleting a comment removes its like rows in the same
    /// transaction.
    pub fn delete_comment_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM likes WHERE comment_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }
}
