use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

const USER_COLUMNS: &str = "id, username, email, display_name, password, avatar_id, avatar_url, \
                            cover_image_id, cover_image_url, refresh_token, created_at";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        display_name: row.get(3)?,
        password: row.get(4)?,
        avatar_id: row.get(5)?,
        avatar_url: row.get(6)?,
        cover_image_id: row.get(7)?,
        cover_image_url: row.get(8)?,
        refresh_token: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        display_name: &str,
        password_hash: &str,
        avatar_id: &str,
        avatar_url: &str,
        cover_image_id: Option<&str>,
        cover_image_url: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, display_name, password, avatar_id, avatar_url, cover_image_id, cover_image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    username,
                    email,
                    display_name,
                    password_hash,
                    avatar_id,
                    avatar_url,
                    cover_image_id,
                    cover_image_url
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                    [username],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Login / duplicate-registration lookup: either identifier matches.
    pub fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?2"),
                    params![username, email],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// `None` clears the stored token (logout); `Some` rotates it.
    pub fn set_refresh_token(&self, id: &str, token: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET refresh_token = ?1 WHERE id = ?2",
                params![token, id],
            )?;
            Ok(())
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                params![password_hash, id],
            )?;
            Ok(())
        })
    }

    pub fn update_user_details(&self, id: &str, display_name: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET display_name = ?1, email = ?2 WHERE id = ?3",
                params![display_name, email, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn update_user_avatar(&self, id: &str, avatar_id: &str, avatar_url: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET avatar_id = ?1, avatar_url = ?2 WHERE id = ?3",
                params![avatar_id, avatar_url, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn update_user_cover_image(
        &self,
        id: &str,
        cover_image_id: &str,
        cover_image_url: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET cover_image_id = ?1, cover_image_url = ?2 WHERE id = ?3",
                params![cover_image_id, cover_image_url, id],
            )?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{seed_user, test_db};

    #[test]
    fn username_and_email_are_unique() {
        let db = test_db();
        seed_user(&db, "alice");

        let dup = db.create_user(
            "other-id",
            "alice",
            "alice2@example.com",
            "Alice Again",
            "hash",
            "a",
            "/assets/a",
            None,
            None,
        );
        assert!(dup.is_err());
    }

    #[test]
    fn lookup_by_either_identifier() {
        let db = test_db();
        let id = seed_user(&db, "bob");

        let by_name = db
            .find_user_by_username_or_email("bob", "")
            .unwrap()
            .expect("found by username");
        assert_eq!(by_name.id, id);

        let by_email = db
            .find_user_by_username_or_email("", "bob@example.com")
            .unwrap()
            .expect("found by email");
        assert_eq!(by_email.id, id);

        assert!(
            db.find_user_by_username_or_email("nobody", "nobody@example.com")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn refresh_token_roundtrip() {
        let db = test_db();
        let id = seed_user(&db, "carol");

        db.set_refresh_token(&id, Some("token-1")).unwrap();
        let user = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("token-1"));

        db.set_refresh_token(&id, None).unwrap();
        let user = db.get_user_by_id(&id).unwrap().unwrap();
        assert!(user.refresh_token.is_none());
    }
}
