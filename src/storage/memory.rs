//! In-process key-value store.

use super::KeyValueStore;
use crate::errors::Result;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Key-value store held in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_entries() -> Result<()> {
        let store = MemoryStore::new();
        let other_view = store.clone();

        store.set("cart", "[]").await?;
        assert_eq!(other_view.get("cart").await?, Some("[]".to_string()));

        other_view.remove("cart").await?;
        assert!(store.is_empty().await);
        Ok(())
    }
}
