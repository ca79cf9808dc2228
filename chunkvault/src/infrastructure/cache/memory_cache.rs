// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Process Cache
//!
//! TTL cache over a concurrent map, implementing the same [`CacheService`]
//! contract as the Redis backend. Used by tests and by deployments that run
//! without a cache server; semantics are identical so the write-through
//! decorators never care which one they front.
//!
//! Expired entries are dropped lazily on access; there is no background
//! sweeper — the cache is advisory and bounded by the working set of
//! descriptor keys.

use async_trait::async_trait;
use chunkvault_domain::{CacheService, EngineError, OperationContext};
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// DashMap-backed TTL cache.
#[derive(Default)]
pub struct MemoryCacheService {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry count (expired entries not yet collected are skipped)
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheService for MemoryCacheService {
    async fn get(&self, key: &str, _ctx: &OperationContext) -> Result<Option<String>, EngineError> {
        // The read guard must drop before the expired entry is removed.
        let live = match self.entries.get(key) {
            Some(entry) if entry.is_live() => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(None),
        };
        match live {
            Some(value) => Ok(Some(value)),
            None => {
                self.entries.remove(key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration, _ctx: &OperationContext) -> Result<(), EngineError> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str, _ctx: &OperationContext) -> Result<(), EngineError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str, ctx: &OperationContext) -> Result<bool, EngineError> {
        Ok(self.get(key, ctx).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCacheService::new();
        let ctx = OperationContext::new();

        cache.set("k", "v", Duration::from_secs(60), &ctx).await.unwrap();
        assert_eq!(cache.get("k", &ctx).await.unwrap().as_deref(), Some("v"));
        assert!(cache.exists("k", &ctx).await.unwrap());

        cache.delete("k", &ctx).await.unwrap();
        assert!(cache.get("k", &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_vanish() {
        let cache = MemoryCacheService::new();
        let ctx = OperationContext::new();

        cache.set("k", "v", Duration::from_millis(10), &ctx).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k", &ctx).await.unwrap().is_none());
        assert!(!cache.exists("k", &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let cache = MemoryCacheService::new();
        let ctx = OperationContext::new();
        cache.delete("never-set", &ctx).await.unwrap();
    }
}
