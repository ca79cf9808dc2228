// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Redis Cache
//!
//! Production [`CacheService`] backend over a Redis connection manager. The
//! manager multiplexes one connection and reconnects on failure; every error
//! is reported as [`EngineError::Cache`], which the write-through decorators
//! treat as advisory (log, fall back to the repository).
//!
//! Payloads are the same JSON descriptor documents the repositories store,
//! keyed by descriptor ID with a short namespace prefix.

use async_trait::async_trait;
use chunkvault_domain::{CacheService, EngineError, OperationContext};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

/// Redis-backed write-through cache.
pub struct RedisCacheService {
    manager: ConnectionManager,
    namespace: String,
}

impl RedisCacheService {
    /// Connects to the configured Redis instance.
    ///
    /// # Errors
    /// [`EngineError::Cache`] when the URL is invalid or the initial
    /// connection fails; callers may choose to continue without a cache.
    pub async fn connect(url: &str, namespace: impl Into<String>) -> Result<Self, EngineError> {
        let client =
            redis::Client::open(url).map_err(|e| EngineError::cache(format!("invalid redis url: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| EngineError::cache(format!("redis connection failed: {}", e)))?;
        Ok(RedisCacheService {
            manager,
            namespace: namespace.into(),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn cache_error(action: &str, err: redis::RedisError) -> EngineError {
        EngineError::cache(format!("redis {} failed: {}", action, err))
    }
}

#[async_trait]
impl CacheService for RedisCacheService {
    async fn get(&self, key: &str, ctx: &OperationContext) -> Result<Option<String>, EngineError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn
            .get(self.namespaced(key))
            .await
            .map_err(|e| Self::cache_error("get", e))?;
        debug!(correlation_id = %ctx.correlation_id(), key, hit = value.is_some(), "cache get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration, _ctx: &OperationContext) -> Result<(), EngineError> {
        let mut conn = self.manager.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(self.namespaced(key), value, seconds)
            .await
            .map_err(|e| Self::cache_error("set", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str, _ctx: &OperationContext) -> Result<(), EngineError> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .del(self.namespaced(key))
            .await
            .map_err(|e| Self::cache_error("del", e))?;
        Ok(())
    }

    async fn exists(&self, key: &str, _ctx: &OperationContext) -> Result<bool, EngineError> {
        let mut conn = self.manager.clone();
        let exists: bool = conn
            .exists(self.namespaced(key))
            .await
            .map_err(|e| Self::cache_error("exists", e))?;
        Ok(exists)
    }
}
