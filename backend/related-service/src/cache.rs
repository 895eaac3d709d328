//! Caching layer for recipient snapshots and per-entity candidate lists.
//!
//! Lookups hit the cache first; any backend failure or corrupted entry
//! degrades to a miss so callers recompute instead of erroring. Writes
//! are best effort.

use crate::error::ServiceResult;
use crate::metrics;
use crate::models::{FederatedIdentity, RelatedResource};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Storage backend for cached entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> ServiceResult<()>;

    /// Drop every entry owned by this store.
    async fn clear(&self) -> ServiceResult<()>;
}

/// Redis-backed store; every key lives under a namespace so clearing
/// never touches other tenants of the same instance.
pub struct RedisStore {
    redis: ConnectionManager,
    namespace: String,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        // the manager multiplexes one connection; clones are cheap
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> ServiceResult<()> {
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(self.full_key(key), value, ttl_secs)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> ServiceResult<()> {
        let pattern = format!("{}/*", self.namespace);
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut total_deleted = 0;

        loop {
            // SCAN instead of KEYS to avoid blocking
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key);
                }
                pipe.query_async::<_, ()>(&mut conn).await?;
                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = total_deleted, "Cache cleared");
        Ok(())
    }
}

/// In-process store used by tests and single-node deployments.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> ServiceResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> ServiceResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn clear(&self) -> ServiceResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

/// Typed cache facade over the two entry families the engine uses.
#[derive(Clone)]
pub struct RelatedCache {
    store: Arc<dyn CacheStore>,
    recipient_ttl_secs: u64,
    related_ttl_secs: u64,
}

impl RelatedCache {
    pub fn new(store: Arc<dyn CacheStore>, recipient_ttl_secs: u64, related_ttl_secs: u64) -> Self {
        Self {
            store,
            recipient_ttl_secs,
            related_ttl_secs,
        }
    }

    fn shares_key(provider_id: &str, item_id: &str) -> String {
        format!("shares/{provider_id}::{item_id}")
    }

    fn related_key(provider_id: &str, single_id: &str) -> String {
        format!("relatedToEntity/{provider_id}::{single_id}")
    }

    pub async fn recipients(
        &self,
        provider_id: &str,
        item_id: &str,
    ) -> Option<Vec<FederatedIdentity>> {
        self.fetch(&Self::shares_key(provider_id, item_id), "recipients")
            .await
    }

    pub async fn store_recipients(
        &self,
        provider_id: &str,
        item_id: &str,
        recipients: &[FederatedIdentity],
    ) {
        self.store(
            &Self::shares_key(provider_id, item_id),
            &recipients,
            self.recipient_ttl_secs,
        )
        .await;
    }

    pub async fn related(
        &self,
        provider_id: &str,
        single_id: &str,
    ) -> Option<Vec<RelatedResource>> {
        self.fetch(&Self::related_key(provider_id, single_id), "related")
            .await
    }

    pub async fn store_related(
        &self,
        provider_id: &str,
        single_id: &str,
        related: &[RelatedResource],
    ) {
        self.store(
            &Self::related_key(provider_id, single_id),
            &related,
            self.related_ttl_secs,
        )
        .await;
    }

    pub async fn flush(&self) -> ServiceResult<()> {
        self.store.clear().await
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str, family: &'static str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(data)) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    metrics::record_cache_hit(family);
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cache deserialization failed");
                    metrics::record_cache_miss(family);
                    None
                }
            },
            Ok(None) => {
                metrics::record_cache_miss(family);
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                metrics::record_cache_miss(family);
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache serialization failed");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &data, ttl_secs).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}
