//! `SQLite`-backed key-value store built on the `storage_entries` table.

use super::KeyValueStore;
use crate::{
    entities::{StorageEntry, storage_entry},
    errors::Result,
};
use sea_orm::{DatabaseConnection, Set, prelude::*, sea_query::OnConflict};
use tracing::{debug, instrument};

/// Key-value store persisted in the application database.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Wraps an established connection. The storage table must already exist
    /// (see [`crate::config::database::create_tables`]).
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl KeyValueStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = StorageEntry::find_by_id(key.to_string()).one(&self.db).await?;
        debug!("Storage read '{}': {}", key, if entry.is_some() { "hit" } else { "miss" });
        Ok(entry.map(|e| e.value))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = storage_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now()),
        };

        StorageEntry::insert(entry)
            .on_conflict(
                OnConflict::column(storage_entry::Column::Key)
                    .update_columns([
                        storage_entry::Column::Value,
                        storage_entry::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        debug!("Storage write '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let result = StorageEntry::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        debug!("Storage remove '{}': {} row(s)", key, result.rows_affected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_set_and_get_new_key() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);

        store.set("cart", "[]").await?;

        assert_eq!(store.get("cart").await?, Some("[]".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_updates_existing_key() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);

        store.set("chat", "[1]").await?;
        store.set("chat", "[1,2]").await?;

        assert_eq!(
            store.get("chat").await?,
            Some("[1,2]".to_string()),
            "Second write should replace the first"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_get_non_existent_key() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);
        assert!(store.get("this_key_does_not_exist").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_deletes_and_tolerates_missing_keys() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);
        store.set("orders", "[]").await?;

        store.remove("orders").await?;
        assert!(store.get("orders").await?.is_none());

        store.remove("orders").await?;
        Ok(())
    }
}
