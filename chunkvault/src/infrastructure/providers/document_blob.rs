// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Document-Store Blob Provider
//!
//! Stores chunk blobs in the metadata document store's blob facility: one
//! row per chunk in the `chunk_blobs` table, keyed by the chunk key. A
//! single-statement `INSERT OR REPLACE` makes each write atomic — the blob
//! is either fully retrievable or absent.
//!
//! `storage_path` is simply the blob key; the table is created by the shared
//! schema bootstrap alongside the metadata tables.

use async_trait::async_trait;
use chunkvault_domain::{ChunkKey, EngineError, OperationContext, StorageProvider};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Chunk-blob backend over the document store's blob table.
pub struct DocumentBlobProvider {
    provider_id: String,
    pool: SqlitePool,
}

impl DocumentBlobProvider {
    pub fn new(provider_id: impl Into<String>, pool: SqlitePool) -> Self {
        DocumentBlobProvider {
            provider_id: provider_id.into(),
            pool,
        }
    }

    fn db_error(&self, action: &str, err: sqlx::Error) -> EngineError {
        EngineError::storage(&self.provider_id, format!("blob {} failed: {}", action, err))
    }
}

#[async_trait]
impl StorageProvider for DocumentBlobProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn kind(&self) -> &str {
        "document-blob"
    }

    async fn write_chunk(&self, key: &ChunkKey, data: &[u8], ctx: &OperationContext) -> Result<String, EngineError> {
        sqlx::query("INSERT OR REPLACE INTO chunk_blobs (key, data, created_at) VALUES (?, ?, ?)")
            .bind(key.as_str())
            .bind(data)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| self.db_error("insert", e))?;

        debug!(
            correlation_id = %ctx.correlation_id(),
            provider = %self.provider_id,
            key = %key,
            bytes = data.len(),
            "chunk written"
        );
        Ok(key.as_str().to_string())
    }

    async fn read_chunk(
        &self,
        _key: &ChunkKey,
        storage_path: &str,
        _ctx: &OperationContext,
    ) -> Result<Vec<u8>, EngineError> {
        let row = sqlx::query("SELECT data FROM chunk_blobs WHERE key = ?")
            .bind(storage_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.db_error("select", e))?;

        match row {
            Some(row) => Ok(row.get::<Vec<u8>, _>("data")),
            None => Err(EngineError::storage(
                &self.provider_id,
                format!("blob '{}' not found", storage_path),
            )),
        }
    }

    async fn chunk_exists(
        &self,
        _key: &ChunkKey,
        storage_path: &str,
        _ctx: &OperationContext,
    ) -> Result<bool, EngineError> {
        let row = sqlx::query("SELECT 1 FROM chunk_blobs WHERE key = ?")
            .bind(storage_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.db_error("select", e))?;
        Ok(row.is_some())
    }

    async fn delete_chunk(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<bool, EngineError> {
        sqlx::query("DELETE FROM chunk_blobs WHERE key = ?")
            .bind(storage_path)
            .execute(&self.pool)
            .await
            .map_err(|e| self.db_error("delete", e))?;

        debug!(
            correlation_id = %ctx.correlation_id(),
            provider = %self.provider_id,
            key = %key,
            "chunk deleted"
        );
        // Idempotent whether or not a row was removed.
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema;
    use chunkvault_domain::FileId;

    async fn pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let provider = DocumentBlobProvider::new("blob-test", pool().await);
        let ctx = OperationContext::new();
        let key = ChunkKey::new(&FileId::generate(), 0);

        let path = provider.write_chunk(&key, b"blob bytes", &ctx).await.unwrap();
        assert_eq!(path, key.as_str());
        assert!(provider.chunk_exists(&key, &path, &ctx).await.unwrap());
        assert_eq!(provider.read_chunk(&key, &path, &ctx).await.unwrap(), b"blob bytes");
    }

    #[tokio::test]
    async fn test_overwrite_is_atomic_replacement() {
        let provider = DocumentBlobProvider::new("blob-test", pool().await);
        let ctx = OperationContext::new();
        let key = ChunkKey::new(&FileId::generate(), 0);

        provider.write_chunk(&key, b"first", &ctx).await.unwrap();
        let path = provider.write_chunk(&key, b"second", &ctx).await.unwrap();
        assert_eq!(provider.read_chunk(&key, &path, &ctx).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let provider = DocumentBlobProvider::new("blob-test", pool().await);
        let ctx = OperationContext::new();
        let key = ChunkKey::new(&FileId::generate(), 2);

        let path = provider.write_chunk(&key, b"x", &ctx).await.unwrap();
        assert!(provider.delete_chunk(&key, &path, &ctx).await.unwrap());
        assert!(provider.delete_chunk(&key, &path, &ctx).await.unwrap());
        assert!(!provider.chunk_exists(&key, &path, &ctx).await.unwrap());
    }
}
