//! State store trait definition.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{StorageError, StorageResult};

/// Key-value store for per-wallet state.
///
/// Implementations persist opaque JSON values under string keys. The store is
/// the single shared mutable resource of the entitlement tracker; writes are
/// last-writer-wins with no cross-process locking.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the raw value for a key, if present.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store the raw value for a key, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Fetch and decode a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> StorageResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Encode and store a JSON value.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::Backend(format!("encoding value: {}", e)))?;
    store.set(key, &raw).await
}
