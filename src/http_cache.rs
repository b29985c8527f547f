//! Persistent HTTP response cache
//!
//! Provider response bodies keyed by request signature (the full request
//! URL), each stored with an expiry. Independent of the record cache in
//! [`crate::store`]: this one only saves network round-trips within its TTL.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredResponse {
    body: Vec<u8>,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct ResponseCache {
    _db: fjall::Database,
    store: Keyspace,
    ttl: Duration,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl ResponseCache {
    /// Opens (or creates) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("responses", fjall::KeyspaceCreateOptions::default)?;
        Ok(ResponseCache {
            _db: db,
            store: items,
            ttl,
        })
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a response body under `signature` for the cache TTL.
    #[tracing::instrument(name = "put_response", level = "debug", skip(self, body), fields(bytes = body.len()))]
    pub async fn put(&self, signature: &str, body: Vec<u8>) -> Result<()> {
        let store = self.store.clone();
        let key = signature.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(self.ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredResponse { body, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a body if it exists and has not expired.
    /// Returns `None` for misses and expired entries.
    #[tracing::instrument(name = "query_response", level = "debug", skip(self))]
    pub async fn get(&self, signature: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store.clone();
        let key_bytes = signature.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        if let Some(bytes) = maybe_bytes {
            let entry: StoredResponse = postcard::from_bytes(&bytes)?;
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

            if now < entry.expires_at {
                tracing::debug!("Response found and still fresh");
                Ok(Some(entry.body))
            } else {
                tracing::debug!("Response found but expired");
                self.remove(signature).await?;
                Ok(None)
            }
        } else {
            tracing::debug!("Response not cached");
            Ok(None)
        }
    }

    /// Removes a response, e.g. one whose body turned out to be unusable.
    pub async fn remove(&self, signature: &str) -> Result<()> {
        let key = signature.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str = "https://api.open-meteo.com/v1/forecast?latitude=38.2542";

    #[tokio::test]
    async fn test_put_then_get_while_fresh() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), Duration::from_secs(3600)).unwrap();

        cache.put(URL, b"{\"daily\":{}}".to_vec()).await.unwrap();
        let body = cache.get(URL).await.unwrap();
        assert_eq!(body.as_deref(), Some(&b"{\"daily\":{}}"[..]));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), Duration::ZERO).unwrap();

        cache.put(URL, b"stale".to_vec()).await.unwrap();
        assert!(cache.get(URL).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signatures_are_distinct() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), Duration::from_secs(3600)).unwrap();

        cache.put(URL, b"imperial".to_vec()).await.unwrap();
        let other = format!("{URL}&temperature_unit=celsius");
        assert!(cache.get(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(dir.path(), Duration::from_secs(3600)).unwrap();

        cache.put(URL, b"body".to_vec()).await.unwrap();
        cache.remove(URL).await.unwrap();
        assert!(cache.get(URL).await.unwrap().is_none());
    }
}
