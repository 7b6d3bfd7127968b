//! Durable key-value storage for carts, chat logs and order history.
//!
//! Every persisted record is one JSON document under a string key. The
//! [`KeyValueStore`] trait is the only way the rest of the crate touches storage;
//! [`DatabaseStore`] keeps documents in `SQLite` and [`MemoryStore`] keeps them in
//! process memory. Operations are awaited to completion before they return, so a
//! read that follows a write always observes it.

mod database;
mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

use crate::errors::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::HashMap, future::Future, sync::Arc};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Storage keys used by the storefront.
///
/// Keys can be scoped to one customer so a single database can hold many
/// independent carts.
pub mod keys {
    /// Cart line items
    pub const CART: &str = "cart";
    /// Chat message log
    pub const CHAT: &str = "chat";
    /// Order history
    pub const ORDERS: &str = "orders";

    /// Builds a key for `namespace` owned by `owner`, e.g. `cart:1234`.
    #[must_use]
    pub fn scoped(namespace: &str, owner: &str) -> String {
        format!("{namespace}:{owner}")
    }
}

/// A string-keyed document store.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the document stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Stores `value` under `key`, replacing any previous document.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Deletes the document stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Why a stored document could not be turned back into a record.
#[derive(Debug, Error)]
pub enum ReadFailure {
    /// The store itself failed
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] crate::errors::Error),
    /// The document exists but is not valid for the requested type
    #[error("malformed record: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Per-key async locks that serialize read-modify-write cycles on one document.
///
/// Clones share the same lock table. Entries nobody is holding or waiting on
/// are pruned on the next call to [`KeyLocks::lock`].
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    table: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl KeyLocks {
    /// An empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`; access ends when the guard is dropped.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().await;
            table.retain(|k, l| k == key || Arc::strong_count(l) > 1);
            Arc::clone(table.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked.
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    /// Whether no key is tracked.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}

/// Reads and deserializes the document under `key`.
///
/// Returns `Ok(None)` when nothing is stored.
pub async fn read_json<S, T>(store: &S, key: &str) -> std::result::Result<Option<T>, ReadFailure>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await.map_err(ReadFailure::Unavailable)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(ReadFailure::Malformed)
}

/// Reads the document under `key`, substituting `T::default()` when it is absent,
/// unreadable or malformed. Failures are logged, never returned.
pub async fn read_json_or_default<S, T>(store: &S, key: &str) -> T
where
    S: KeyValueStore,
    T: DeserializeOwned + Default,
{
    match read_json(store, key).await {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(failure) => {
            tracing::warn!("Resetting '{key}' to an empty default: {failure}");
            T::default()
        }
    }
}

/// Serializes `value` and stores it under `key`.
pub async fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_round_trip() -> Result<()> {
        let store = MemoryStore::new();
        write_json(&store, "numbers", &vec![1, 2, 3]).await?;

        let back: Option<Vec<i32>> = read_json(&store, "numbers").await.ok().flatten();
        assert_eq!(back, Some(vec![1, 2, 3]));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_json_reports_malformed_documents() -> Result<()> {
        let store = MemoryStore::new();
        store.set("numbers", "{not json").await?;

        let result: std::result::Result<Option<Vec<i32>>, _> = read_json(&store, "numbers").await;
        assert!(matches!(result, Err(ReadFailure::Malformed(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_json_or_default_recovers_from_corruption() -> Result<()> {
        let store = MemoryStore::new();
        store.set("numbers", "[1, \"two\"").await?;

        let value: Vec<i32> = read_json_or_default(&store, "numbers").await;
        assert!(value.is_empty());

        let missing: Vec<i32> = read_json_or_default(&store, "absent").await;
        assert!(missing.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_failure_keeps_its_source() -> Result<()> {
        let store = MemoryStore::new();
        store.set("numbers", "{not json").await?;

        let Err(failure) = read_json::<_, Vec<i32>>(&store, "numbers").await else {
            panic!("A malformed document must not decode");
        };
        assert!(failure.to_string().starts_with("malformed record: "));
        assert!(std::error::Error::source(&failure).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_key_locks_are_exclusive_per_key() {
        let locks = KeyLocks::new();
        let held = locks.lock("cart:ana").await;

        let same_key = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.lock("cart:ana"),
        )
        .await;
        assert!(same_key.is_err(), "Second lock on the same key must wait");

        let other_key = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.lock("cart:rui"),
        )
        .await;
        assert!(other_key.is_ok(), "Other keys are independent");

        drop(held);
        drop(other_key);
        let _again = locks.lock("cart:ana").await;
        assert_eq!(locks.len().await, 1, "Idle entries are pruned");
    }

    #[test]
    fn test_scoped_keys() {
        assert_eq!(keys::scoped(keys::CART, "42"), "cart:42");
        assert_eq!(keys::scoped(keys::ORDERS, "ana"), "orders:ana");
    }
}
