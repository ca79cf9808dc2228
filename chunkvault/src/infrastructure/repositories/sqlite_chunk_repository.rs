// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Chunk Metadata Repository
//!
//! Document-store implementation of [`ChunkMetadataRepository`]. One JSON
//! document per chunk; `file_id` and `sequence_number` are mirrored into
//! indexed columns so the manifest query (`get_chunks_by_file_id`, sorted by
//! sequence) never decodes documents it does not need.

use async_trait::async_trait;
use chunkvault_domain::{ChunkDescriptor, ChunkMetadataRepository, EngineError, FileId, OperationContext};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Chunk descriptor persistence over the SQLite document store.
pub struct SqliteChunkRepository {
    pool: SqlitePool,
}

impl SqliteChunkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteChunkRepository { pool }
    }

    fn db_error(action: &str, err: sqlx::Error) -> EngineError {
        EngineError::database(format!("chunk repository {} failed: {}", action, err))
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChunkDescriptor, EngineError> {
        let data: String = row.get("data");
        serde_json::from_str(&data)
            .map_err(|e| EngineError::Serialization(format!("chunk descriptor decode failed: {}", e)))
    }
}

#[async_trait]
impl ChunkMetadataRepository for SqliteChunkRepository {
    async fn add(&self, descriptor: &ChunkDescriptor, ctx: &OperationContext) -> Result<(), EngineError> {
        ctx.check_canceled()?;
        let data = serde_json::to_string(descriptor)?;
        sqlx::query(
            "INSERT INTO chunk_descriptors (id, file_id, sequence_number, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&descriptor.id)
        .bind(descriptor.file_id.as_str())
        .bind(descriptor.sequence_number as i64)
        .bind(&data)
        .bind(descriptor.created_at.to_rfc3339())
        .bind(descriptor.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::db_error("insert", e))?;

        debug!(
            correlation_id = %ctx.correlation_id(),
            chunk_id = %descriptor.id,
            sequence = descriptor.sequence_number,
            "chunk descriptor added"
        );
        Ok(())
    }

    async fn get_by_id(&self, id: &str, ctx: &OperationContext) -> Result<Option<ChunkDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let row = sqlx::query("SELECT data FROM chunk_descriptors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::db_error("select", e))?;
        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn update(&self, descriptor: &ChunkDescriptor, ctx: &OperationContext) -> Result<bool, EngineError> {
        ctx.check_canceled()?;
        let data = serde_json::to_string(descriptor)?;
        let result = sqlx::query(
            "UPDATE chunk_descriptors SET file_id = ?, sequence_number = ?, data = ?, updated_at = ? WHERE id = ?",
        )
        .bind(descriptor.file_id.as_str())
        .bind(descriptor.sequence_number as i64)
        .bind(&data)
        .bind(descriptor.updated_at.to_rfc3339())
        .bind(&descriptor.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::db_error("update", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str, ctx: &OperationContext) -> Result<bool, EngineError> {
        ctx.check_canceled()?;
        let result = sqlx::query("DELETE FROM chunk_descriptors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_all(&self, ctx: &OperationContext) -> Result<Vec<ChunkDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let rows = sqlx::query("SELECT data FROM chunk_descriptors ORDER BY file_id, sequence_number")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select all", e))?;
        rows.iter().map(Self::decode_row).collect()
    }

    async fn get_chunks_by_file_id(
        &self,
        file_id: &FileId,
        ctx: &OperationContext,
    ) -> Result<Vec<ChunkDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let rows = sqlx::query("SELECT data FROM chunk_descriptors WHERE file_id = ? ORDER BY sequence_number")
            .bind(file_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select by file", e))?;
        rows.iter().map(Self::decode_row).collect()
    }

    async fn delete_chunks_by_file_id(&self, file_id: &FileId, ctx: &OperationContext) -> Result<u64, EngineError> {
        ctx.check_canceled()?;
        let result = sqlx::query("DELETE FROM chunk_descriptors WHERE file_id = ?")
            .bind(file_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("delete by file", e))?;
        debug!(
            correlation_id = %ctx.correlation_id(),
            file_id = %file_id,
            removed = result.rows_affected(),
            "chunk descriptors deleted"
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema;
    use chunkvault_domain::CorrelationId;

    async fn repository() -> SqliteChunkRepository {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        SqliteChunkRepository::new(pool)
    }

    fn chunk(file_id: &FileId, seq: u64) -> ChunkDescriptor {
        let mut descriptor = ChunkDescriptor::new(file_id.clone(), seq, 128, "ab".repeat(32), CorrelationId::generate());
        descriptor.mark_stored("fs", format!("aa/bb/{}_{}", file_id, seq));
        descriptor
    }

    #[tokio::test]
    async fn test_add_get_round_trip() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let file_id = FileId::generate();
        let descriptor = chunk(&file_id, 0);

        repo.add(&descriptor, &ctx).await.unwrap();
        let loaded = repo.get_by_id(&descriptor.id, &ctx).await.unwrap().unwrap();
        assert_eq!(loaded, descriptor);
    }

    #[tokio::test]
    async fn test_manifest_sorted_by_sequence() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let file_id = FileId::generate();
        // Inserted out of order on purpose
        for seq in [2u64, 0, 1] {
            repo.add(&chunk(&file_id, seq), &ctx).await.unwrap();
        }
        repo.add(&chunk(&FileId::generate(), 0), &ctx).await.unwrap();

        let manifest = repo.get_chunks_by_file_id(&file_id, &ctx).await.unwrap();
        let sequences: Vec<u64> = manifest.iter().map(|c| c.sequence_number).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_delete_by_file_id_counts_rows() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let file_id = FileId::generate();
        for seq in 0..3 {
            repo.add(&chunk(&file_id, seq), &ctx).await.unwrap();
        }

        assert_eq!(repo.delete_chunks_by_file_id(&file_id, &ctx).await.unwrap(), 3);
        assert_eq!(repo.delete_chunks_by_file_id(&file_id, &ctx).await.unwrap(), 0);
        assert!(repo.get_chunks_by_file_id(&file_id, &ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_reports_matched_document() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let file_id = FileId::generate();
        let mut descriptor = chunk(&file_id, 0);

        assert!(!repo.update(&descriptor, &ctx).await.unwrap());
        repo.add(&descriptor, &ctx).await.unwrap();
        descriptor.record_access();
        assert!(repo.update(&descriptor, &ctx).await.unwrap());
        let loaded = repo.get_by_id(&descriptor.id, &ctx).await.unwrap().unwrap();
        assert!(loaded.last_access_time.is_some());
    }
}
