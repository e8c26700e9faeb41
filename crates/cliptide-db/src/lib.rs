pub mod migrations;
pub mod models;
pub mod pagination;
pub mod queries;
pub mod views;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Mutable access for multi-statement sequences that need a
    /// `rusqlite::Transaction` (toggles, cascading deletes).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut conn)
    }
}

/// True when the error chain bottoms out in a SQLite constraint
/// failure (unique index, CHECK, foreign key). Callers racing a
/// check-then-act can treat these as conflicts rather than faults.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    })
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::Database;
    use uuid::Uuid;

    pub fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory db")
    }

    pub fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(
            &id,
            username,
            &format!("{username}@example.com"),
            username,
            "$argon2id$fake-hash",
            "avatar-asset",
            &format!("/assets/{username}-avatar"),
            None,
            None,
        )
        .expect("seed user");
        id
    }

    pub fn seed_video(db: &Database, owner_id: &str, title: &str, published: bool) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_video(
            &id,
            title,
            "a description",
            "video-asset",
            &format!("/assets/{title}.mp4"),
            "thumb-asset",
            &format!("/assets/{title}.png"),
            42.0,
            owner_id,
        )
        .expect("seed video");
        if published {
            db.set_publish_status(&id, true).expect("publish");
        }
        id
    }

    pub fn seed_comment(db: &Database, video_id: &str, owner_id: &str, content: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_comment(&id, content, video_id, owner_id)
            .expect("seed comment");
        id
    }

    pub fn seed_tweet(db: &Database, author_id: &str, content: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_tweet(&id, content, author_id).expect("seed tweet");
        id
    }
}

#[cfg(test)]
mod tests {
    use super::is_constraint_violation;
    use super::testutil::{seed_user, test_db};
    use uuid::Uuid;

    #[test]
    fn duplicate_username_reads_as_a_constraint_violation() {
        let db = test_db();
        seed_user(&db, "alice");

        let err = db
            .create_user(
                &Uuid::new_v4().to_string(),
                "alice",
                "alice-again@example.com",
                "Alice",
                "$argon2id$fake-hash",
                "avatar-asset",
                "/assets/alice-avatar",
                None,
                None,
            )
            .unwrap_err();

        assert!(is_constraint_violation(&err));
        assert!(!is_constraint_violation(&anyhow::anyhow!("disk on fire")));
    }
}
