// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Write-Through Cached Repositories
//!
//! Decorators implementing the repository ports over an inner repository
//! plus a [`CacheService`]. The ordering rules are fixed:
//!
//! - **Reads**: cache first; on miss fall through to the repository and
//!   repopulate on success
//! - **Writes**: repository first, cache second — a failed repository write
//!   never reaches the cache
//! - **Deletes**: cache invalidated *before* the repository delete is
//!   acknowledged
//! - **Cache failures**: advisory; logged with the correlation ID and
//!   ignored
//!
//! Files are cached by descriptor ID and by the `full_path` query key.
//! Chunks are cached by descriptor ID only; the manifest query stays on the
//! repository, which is authoritative during uploads.

use async_trait::async_trait;
use chunkvault_domain::{
    CacheService, ChunkDescriptor, ChunkMetadataRepository, DescriptorKind, EngineError, FileDescriptor, FileId,
    FileMetadataRepository, OperationContext,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn file_key(id: &FileId) -> String {
    format!("file:{}", id)
}

fn file_path_key(full_path: &str) -> String {
    format!("file:path:{}", full_path)
}

fn chunk_key(id: &str) -> String {
    format!("chunk:{}", id)
}

async fn cache_lookup<T: DeserializeOwned>(
    cache: &Arc<dyn CacheService>,
    key: &str,
    ctx: &OperationContext,
) -> Option<T> {
    match cache.get(key, ctx).await {
        Ok(Some(payload)) => match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(correlation_id = %ctx.correlation_id(), key, error = %err, "cache payload decode failed");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(correlation_id = %ctx.correlation_id(), key, error = %err, "cache get failed, falling back");
            None
        }
    }
}

async fn cache_store<T: Serialize>(
    cache: &Arc<dyn CacheService>,
    key: &str,
    value: &T,
    ttl: Duration,
    ctx: &OperationContext,
) {
    match serde_json::to_string(value) {
        Ok(payload) => {
            if let Err(err) = cache.set(key, &payload, ttl, ctx).await {
                warn!(correlation_id = %ctx.correlation_id(), key, error = %err, "cache set failed");
            }
        }
        Err(err) => {
            warn!(correlation_id = %ctx.correlation_id(), key, error = %err, "cache payload encode failed");
        }
    }
}

async fn cache_invalidate(cache: &Arc<dyn CacheService>, key: &str, ctx: &OperationContext) {
    if let Err(err) = cache.delete(key, ctx).await {
        warn!(correlation_id = %ctx.correlation_id(), key, error = %err, "cache invalidation failed");
    }
}

/// Write-through decorator for the file metadata repository.
pub struct CachedFileMetadataRepository {
    inner: Arc<dyn FileMetadataRepository>,
    cache: Arc<dyn CacheService>,
    ttl: Duration,
}

impl CachedFileMetadataRepository {
    pub fn new(inner: Arc<dyn FileMetadataRepository>, cache: Arc<dyn CacheService>, ttl: Duration) -> Self {
        CachedFileMetadataRepository { inner, cache, ttl }
    }

    async fn populate(&self, descriptor: &FileDescriptor, ctx: &OperationContext) {
        cache_store(&self.cache, &file_key(&descriptor.id), descriptor, self.ttl, ctx).await;
        cache_store(
            &self.cache,
            &file_path_key(&descriptor.full_path),
            descriptor,
            self.ttl,
            ctx,
        )
        .await;
    }

    async fn invalidate(&self, id: &FileId, full_path: Option<&str>, ctx: &OperationContext) {
        cache_invalidate(&self.cache, &file_key(id), ctx).await;
        if let Some(path) = full_path {
            cache_invalidate(&self.cache, &file_path_key(path), ctx).await;
        }
    }
}

#[async_trait]
impl FileMetadataRepository for CachedFileMetadataRepository {
    async fn add(&self, descriptor: &FileDescriptor, ctx: &OperationContext) -> Result<(), EngineError> {
        self.inner.add(descriptor, ctx).await?;
        self.populate(descriptor, ctx).await;
        Ok(())
    }

    async fn get_by_id(&self, id: &FileId, ctx: &OperationContext) -> Result<Option<FileDescriptor>, EngineError> {
        if let Some(hit) = cache_lookup::<FileDescriptor>(&self.cache, &file_key(id), ctx).await {
            return Ok(Some(hit));
        }
        let loaded = self.inner.get_by_id(id, ctx).await?;
        if let Some(descriptor) = &loaded {
            self.populate(descriptor, ctx).await;
        }
        Ok(loaded)
    }

    async fn update(&self, descriptor: &FileDescriptor, ctx: &OperationContext) -> Result<bool, EngineError> {
        let matched = self.inner.update(descriptor, ctx).await?;
        if matched {
            self.populate(descriptor, ctx).await;
        }
        Ok(matched)
    }

    async fn delete(&self, id: &FileId, ctx: &OperationContext) -> Result<bool, EngineError> {
        // Invalidate before acknowledging the repository delete.
        let full_path = self.inner.get_by_id(id, ctx).await?.map(|d| d.full_path);
        self.invalidate(id, full_path.as_deref(), ctx).await;
        self.inner.delete(id, ctx).await
    }

    async fn get_all(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        self.inner.get_all(ctx).await
    }

    async fn get_by_full_path(
        &self,
        full_path: &str,
        ctx: &OperationContext,
    ) -> Result<Option<FileDescriptor>, EngineError> {
        if let Some(hit) = cache_lookup::<FileDescriptor>(&self.cache, &file_path_key(full_path), ctx).await {
            return Ok(Some(hit));
        }
        let loaded = self.inner.get_by_full_path(full_path, ctx).await?;
        if let Some(descriptor) = &loaded {
            self.populate(descriptor, ctx).await;
        }
        Ok(loaded)
    }

    async fn get_children(
        &self,
        parent_id: &FileId,
        ctx: &OperationContext,
    ) -> Result<Vec<FileDescriptor>, EngineError> {
        self.inner.get_children(parent_id, ctx).await
    }

    async fn get_by_parent_path(
        &self,
        prefix: &str,
        ctx: &OperationContext,
    ) -> Result<Vec<FileDescriptor>, EngineError> {
        self.inner.get_by_parent_path(prefix, ctx).await
    }

    async fn get_by_kind(
        &self,
        kind: DescriptorKind,
        ctx: &OperationContext,
    ) -> Result<Vec<FileDescriptor>, EngineError> {
        self.inner.get_by_kind(kind, ctx).await
    }

    async fn get_non_indexed(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        self.inner.get_non_indexed(ctx).await
    }

    async fn get_by_tags(&self, tags: &[String], ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        self.inner.get_by_tags(tags, ctx).await
    }
}

/// Write-through decorator for the chunk metadata repository.
pub struct CachedChunkMetadataRepository {
    inner: Arc<dyn ChunkMetadataRepository>,
    cache: Arc<dyn CacheService>,
    ttl: Duration,
}

impl CachedChunkMetadataRepository {
    pub fn new(inner: Arc<dyn ChunkMetadataRepository>, cache: Arc<dyn CacheService>, ttl: Duration) -> Self {
        CachedChunkMetadataRepository { inner, cache, ttl }
    }
}

#[async_trait]
impl ChunkMetadataRepository for CachedChunkMetadataRepository {
    async fn add(&self, descriptor: &ChunkDescriptor, ctx: &OperationContext) -> Result<(), EngineError> {
        self.inner.add(descriptor, ctx).await?;
        cache_store(&self.cache, &chunk_key(&descriptor.id), descriptor, self.ttl, ctx).await;
        Ok(())
    }

    async fn get_by_id(&self, id: &str, ctx: &OperationContext) -> Result<Option<ChunkDescriptor>, EngineError> {
        if let Some(hit) = cache_lookup::<ChunkDescriptor>(&self.cache, &chunk_key(id), ctx).await {
            return Ok(Some(hit));
        }
        let loaded = self.inner.get_by_id(id, ctx).await?;
        if let Some(descriptor) = &loaded {
            cache_store(&self.cache, &chunk_key(id), descriptor, self.ttl, ctx).await;
        }
        Ok(loaded)
    }

    async fn update(&self, descriptor: &ChunkDescriptor, ctx: &OperationContext) -> Result<bool, EngineError> {
        let matched = self.inner.update(descriptor, ctx).await?;
        if matched {
            cache_store(&self.cache, &chunk_key(&descriptor.id), descriptor, self.ttl, ctx).await;
        }
        Ok(matched)
    }

    async fn delete(&self, id: &str, ctx: &OperationContext) -> Result<bool, EngineError> {
        cache_invalidate(&self.cache, &chunk_key(id), ctx).await;
        self.inner.delete(id, ctx).await
    }

    async fn get_all(&self, ctx: &OperationContext) -> Result<Vec<ChunkDescriptor>, EngineError> {
        self.inner.get_all(ctx).await
    }

    async fn get_chunks_by_file_id(
        &self,
        file_id: &FileId,
        ctx: &OperationContext,
    ) -> Result<Vec<ChunkDescriptor>, EngineError> {
        self.inner.get_chunks_by_file_id(file_id, ctx).await
    }

    async fn delete_chunks_by_file_id(&self, file_id: &FileId, ctx: &OperationContext) -> Result<u64, EngineError> {
        // Invalidate every per-chunk entry before the bulk delete returns.
        let chunks = self.inner.get_chunks_by_file_id(file_id, ctx).await?;
        for chunk in &chunks {
            cache_invalidate(&self.cache, &chunk_key(&chunk.id), ctx).await;
        }
        self.inner.delete_chunks_by_file_id(file_id, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::MemoryCacheService;
    use crate::infrastructure::repositories::{schema, SqliteFileRepository};
    use chunkvault_domain::CorrelationId;

    async fn cached_repo() -> (CachedFileMetadataRepository, Arc<MemoryCacheService>) {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        let cache = Arc::new(MemoryCacheService::new());
        let repo = CachedFileMetadataRepository::new(
            Arc::new(SqliteFileRepository::new(pool)),
            cache.clone() as Arc<dyn CacheService>,
            Duration::from_secs(60),
        );
        (repo, cache)
    }

    #[tokio::test]
    async fn test_add_populates_cache() {
        let (repo, cache) = cached_repo().await;
        let ctx = OperationContext::new();
        let descriptor = FileDescriptor::new_file("a.txt", "/a.txt", CorrelationId::generate());

        repo.add(&descriptor, &ctx).await.unwrap();
        assert!(cache.exists(&file_key(&descriptor.id), &ctx).await.unwrap());
        assert!(cache.exists(&file_path_key("/a.txt"), &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_falls_back_and_repopulates() {
        let (repo, cache) = cached_repo().await;
        let ctx = OperationContext::new();
        let descriptor = FileDescriptor::new_file("a.txt", "/a.txt", CorrelationId::generate());
        repo.add(&descriptor, &ctx).await.unwrap();

        // Simulate cache loss
        cache.delete(&file_key(&descriptor.id), &ctx).await.unwrap();
        let loaded = repo.get_by_id(&descriptor.id, &ctx).await.unwrap().unwrap();
        assert_eq!(loaded.id, descriptor.id);
        assert!(cache.exists(&file_key(&descriptor.id), &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_invalidates_before_ack() {
        let (repo, cache) = cached_repo().await;
        let ctx = OperationContext::new();
        let descriptor = FileDescriptor::new_file("a.txt", "/a.txt", CorrelationId::generate());
        repo.add(&descriptor, &ctx).await.unwrap();

        assert!(repo.delete(&descriptor.id, &ctx).await.unwrap());
        assert!(!cache.exists(&file_key(&descriptor.id), &ctx).await.unwrap());
        assert!(!cache.exists(&file_path_key("/a.txt"), &ctx).await.unwrap());
        assert!(repo.get_by_id(&descriptor.id, &ctx).await.unwrap().is_none());
    }
}
