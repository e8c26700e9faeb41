use crate::Database;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl Database {
    /// Subscribe / unsubscribe flip. Returns true when the subscription
    /// now exists. Same transactional shape as the like toggle; the
    /// UNIQUE(subscriber_id, channel_id) constraint backs it up.
    pub fn toggle_subscription(
        &self,
        id: &str,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
                    params![subscriber_id, channel_id],
                    |row| row.get(0),
                )
                .optional()?;

            let subscribed = if let Some(existing_id) = existing {
                tx.execute("DELETE FROM subscriptions WHERE id = ?1", [&existing_id])?;
                false
            } else {
                tx.execute(
                    "INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES (?1, ?2, ?3)",
                    params![id, subscriber_id, channel_id],
                )?;
                true
            };

            tx.commit()?;
            Ok(subscribed)
        })
    }

    pub fn count_subscribers(&self, channel_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1",
                [channel_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn is_subscribed(&self, subscriber_id: &str, channel_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2)",
                params![subscriber_id, channel_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{seed_user, test_db};
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn toggle_subscription_alternates() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        assert!(db.toggle_subscription(&new_id(), &bob, &alice).unwrap());
        assert!(db.is_subscribed(&bob, &alice).unwrap());
        assert_eq!(db.count_subscribers(&alice).unwrap(), 1);

        assert!(!db.toggle_subscription(&new_id(), &bob, &alice).unwrap());
        assert!(!db.is_subscribed(&bob, &alice).unwrap());
        assert_eq!(db.count_subscribers(&alice).unwrap(), 0);

        assert!(db.toggle_subscription(&new_id(), &bob, &alice).unwrap());
        assert_eq!(db.count_subscribers(&alice).unwrap(), 1);
    }

    #[test]
    fn direction_matters() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.toggle_subscription(&new_id(), &bob, &alice).unwrap();

        assert!(db.is_subscribed(&bob, &alice).unwrap());
        assert!(!db.is_subscribed(&alice, &bob).unwrap());
    }
}
