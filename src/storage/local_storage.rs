use anyhow::Result;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Local Storage Operations
    // ========================================================================

    /// Get a stored value by key, or `None` if the key was never set.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM local_storage WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Store a value (UPSERT).
    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a key. Removing a missing key is not an error.
    pub async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get all items whose key starts with `prefix`, ordered by key.
    ///
    /// `LIKE` wildcards in the prefix are escaped, so `keybind.` never
    /// matches `keybindX`.
    pub async fn items_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM local_storage WHERE key LIKE ? ESCAPE '\\' ORDER BY key",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_item_missing() {
        let db = test_db().await;
        assert_eq!(db.get_item("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get_item() {
        let db = test_db().await;
        db.set_item("favoriteCharacters", "[1,2]").await.unwrap();

        let value = db.get_item("favoriteCharacters").await.unwrap();
        assert_eq!(value, Some("[1,2]".to_string()));
    }

    #[tokio::test]
    async fn test_set_item_upsert() {
        let db = test_db().await;
        db.set_item("darkMode", "true").await.unwrap();
        db.set_item("darkMode", "false").await.unwrap();

        assert_eq!(
            db.get_item("darkMode").await.unwrap(),
            Some("false".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_item() {
        let db = test_db().await;
        db.set_item("darkMode", "true").await.unwrap();
        db.remove_item("darkMode").await.unwrap();
        assert_eq!(db.get_item("darkMode").await.unwrap(), None);

        // Removing again is fine
        db.remove_item("darkMode").await.unwrap();
    }

    #[tokio::test]
    async fn test_items_by_prefix() {
        let db = test_db().await;
        db.set_item("keybind.quit", "x").await.unwrap();
        db.set_item("keybind.back", "h").await.unwrap();
        db.set_item("darkMode", "true").await.unwrap();

        let items = db.items_by_prefix("keybind.").await.unwrap();
        assert_eq!(
            items,
            vec![
                ("keybind.back".to_string(), "h".to_string()),
                ("keybind.quit".to_string(), "x".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_items_by_prefix_escapes_wildcards() {
        let db = test_db().await;
        db.set_item("a_b", "1").await.unwrap();
        db.set_item("axb", "2").await.unwrap();

        let items = db.items_by_prefix("a_").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, "a_b");
    }
}
