// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite File Metadata Repository
//!
//! Document-store implementation of [`FileMetadataRepository`]. Each
//! descriptor is one JSON document in `file_descriptors.data`; the mirrored
//! columns (`full_path`, `parent_id`, `kind`, `is_indexed`) back the indexed
//! queries, and `file_tags` backs the ALL-tags match with a
//! `GROUP BY ... HAVING COUNT` query instead of client-side filtering.
//!
//! All statements are parameterized; `update` replaces the whole document
//! keyed by id and reports whether a row matched.

use async_trait::async_trait;
use chunkvault_domain::{
    DescriptorKind, EngineError, FileDescriptor, FileId, FileMetadataRepository, OperationContext,
};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// File descriptor persistence over the SQLite document store.
pub struct SqliteFileRepository {
    pool: SqlitePool,
}

impl SqliteFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteFileRepository { pool }
    }

    fn db_error(action: &str, err: sqlx::Error) -> EngineError {
        EngineError::database(format!("file repository {} failed: {}", action, err))
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<FileDescriptor, EngineError> {
        let data: String = row.get("data");
        serde_json::from_str(&data)
            .map_err(|e| EngineError::Serialization(format!("file descriptor decode failed: {}", e)))
    }

    fn decode_rows(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<FileDescriptor>, EngineError> {
        rows.iter().map(Self::decode_row).collect()
    }

    async fn replace_tags(&self, descriptor: &FileDescriptor) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM file_tags WHERE file_id = ?")
            .bind(descriptor.id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("tag delete", e))?;
        for tag in &descriptor.tags {
            sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag) VALUES (?, ?)")
                .bind(descriptor.id.as_str())
                .bind(tag)
                .execute(&self.pool)
                .await
                .map_err(|e| Self::db_error("tag insert", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileMetadataRepository for SqliteFileRepository {
    async fn add(&self, descriptor: &FileDescriptor, ctx: &OperationContext) -> Result<(), EngineError> {
        ctx.check_canceled()?;
        let data = serde_json::to_string(descriptor)?;
        sqlx::query(
            "INSERT INTO file_descriptors (id, name, full_path, parent_id, kind, is_indexed, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(descriptor.id.as_str())
        .bind(&descriptor.name)
        .bind(&descriptor.full_path)
        .bind(descriptor.parent_id.as_ref().map(|p| p.as_str().to_string()))
        .bind(descriptor.kind.as_str())
        .bind(descriptor.is_indexed)
        .bind(&data)
        .bind(descriptor.created_at.to_rfc3339())
        .bind(descriptor.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::db_error("insert", e))?;

        self.replace_tags(descriptor).await?;
        debug!(correlation_id = %ctx.correlation_id(), file_id = %descriptor.id, "file descriptor added");
        Ok(())
    }

    async fn get_by_id(&self, id: &FileId, ctx: &OperationContext) -> Result<Option<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let row = sqlx::query("SELECT data FROM file_descriptors WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::db_error("select", e))?;
        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn update(&self, descriptor: &FileDescriptor, ctx: &OperationContext) -> Result<bool, EngineError> {
        ctx.check_canceled()?;
        let data = serde_json::to_string(descriptor)?;
        let result = sqlx::query(
            "UPDATE file_descriptors
             SET name = ?, full_path = ?, parent_id = ?, kind = ?, is_indexed = ?, data = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&descriptor.name)
        .bind(&descriptor.full_path)
        .bind(descriptor.parent_id.as_ref().map(|p| p.as_str().to_string()))
        .bind(descriptor.kind.as_str())
        .bind(descriptor.is_indexed)
        .bind(&data)
        .bind(descriptor.updated_at.to_rfc3339())
        .bind(descriptor.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::db_error("update", e))?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        self.replace_tags(descriptor).await?;
        Ok(true)
    }

    async fn delete(&self, id: &FileId, ctx: &OperationContext) -> Result<bool, EngineError> {
        ctx.check_canceled()?;
        sqlx::query("DELETE FROM file_tags WHERE file_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("tag delete", e))?;
        let result = sqlx::query("DELETE FROM file_descriptors WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("delete", e))?;
        debug!(correlation_id = %ctx.correlation_id(), file_id = %id, "file descriptor deleted");
        Ok(result.rows_affected() > 0)
    }

    async fn get_all(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let rows = sqlx::query("SELECT data FROM file_descriptors ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select all", e))?;
        Self::decode_rows(rows)
    }

    async fn get_by_full_path(
        &self,
        full_path: &str,
        ctx: &OperationContext,
    ) -> Result<Option<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let row = sqlx::query("SELECT data FROM file_descriptors WHERE full_path = ? LIMIT 1")
            .bind(full_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::db_error("select by path", e))?;
        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn get_children(
        &self,
        parent_id: &FileId,
        ctx: &OperationContext,
    ) -> Result<Vec<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let rows = sqlx::query("SELECT data FROM file_descriptors WHERE parent_id = ? ORDER BY full_path")
            .bind(parent_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select children", e))?;
        Self::decode_rows(rows)
    }

    async fn get_by_parent_path(
        &self,
        prefix: &str,
        ctx: &OperationContext,
    ) -> Result<Vec<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        // ESCAPE guards the LIKE wildcards living inside real paths.
        let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let rows = sqlx::query(
            "SELECT data FROM file_descriptors WHERE full_path LIKE ? ESCAPE '\\' ORDER BY full_path",
        )
        .bind(format!("{}%", escaped))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::db_error("select by prefix", e))?;
        Self::decode_rows(rows)
    }

    async fn get_by_kind(
        &self,
        kind: DescriptorKind,
        ctx: &OperationContext,
    ) -> Result<Vec<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let rows = sqlx::query("SELECT data FROM file_descriptors WHERE kind = ? ORDER BY full_path")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select by kind", e))?;
        Self::decode_rows(rows)
    }

    async fn get_non_indexed(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        let rows = sqlx::query("SELECT data FROM file_descriptors WHERE kind = 'file' AND is_indexed = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select non-indexed", e))?;
        Self::decode_rows(rows)
    }

    async fn get_by_tags(&self, tags: &[String], ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        ctx.check_canceled()?;
        if tags.is_empty() {
            return self.get_all(ctx).await;
        }
        // Files carrying ALL requested tags: match any, group, require the
        // full count of distinct hits.
        let placeholders = vec!["?"; tags.len()].join(", ");
        let sql = format!(
            "SELECT d.data FROM file_descriptors d
             JOIN file_tags t ON t.file_id = d.id
             WHERE t.tag IN ({})
             GROUP BY d.id
             HAVING COUNT(DISTINCT t.tag) = ?
             ORDER BY d.full_path",
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for tag in tags {
            query = query.bind(tag);
        }
        query = query.bind(tags.len() as i64);
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("select by tags", e))?;
        Self::decode_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema;
    use chunkvault_domain::CorrelationId;

    async fn repository() -> SqliteFileRepository {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        SqliteFileRepository::new(pool)
    }

    fn file(name: &str, path: &str) -> FileDescriptor {
        FileDescriptor::new_file(name, path, CorrelationId::generate())
    }

    #[tokio::test]
    async fn test_add_get_round_trip() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let descriptor = file("a.txt", "/data/a.txt");

        repo.add(&descriptor, &ctx).await.unwrap();
        let loaded = repo.get_by_id(&descriptor.id, &ctx).await.unwrap().unwrap();
        assert_eq!(loaded, descriptor);
    }

    #[tokio::test]
    async fn test_update_reports_matched_document() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let mut descriptor = file("a.txt", "/a.txt");

        assert!(!repo.update(&descriptor, &ctx).await.unwrap());
        repo.add(&descriptor, &ctx).await.unwrap();
        descriptor.finalize_upload("cafe".into(), 10, 1);
        assert!(repo.update(&descriptor, &ctx).await.unwrap());
        let loaded = repo.get_by_id(&descriptor.id, &ctx).await.unwrap().unwrap();
        assert_eq!(loaded.chunk_count, 1);
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let descriptor = file("a.txt", "/a.txt");
        repo.add(&descriptor, &ctx).await.unwrap();

        assert!(repo.delete(&descriptor.id, &ctx).await.unwrap());
        assert!(!repo.delete(&descriptor.id, &ctx).await.unwrap());
        assert!(repo.get_by_id(&descriptor.id, &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_path_and_children_queries() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let dir = FileDescriptor::new_directory("data", "/data", None, CorrelationId::generate());
        let child = file("a.txt", "/data/a.txt").with_parent(dir.id.clone());
        let other = file("b.txt", "/other/b.txt");
        repo.add(&dir, &ctx).await.unwrap();
        repo.add(&child, &ctx).await.unwrap();
        repo.add(&other, &ctx).await.unwrap();

        let by_path = repo.get_by_full_path("/data/a.txt", &ctx).await.unwrap().unwrap();
        assert_eq!(by_path.id, child.id);

        let children = repo.get_children(&dir.id, &ctx).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);

        let under_data = repo.get_by_parent_path("/data", &ctx).await.unwrap();
        assert_eq!(under_data.len(), 2);

        let dirs = repo.get_by_kind(DescriptorKind::Directory, &ctx).await.unwrap();
        assert_eq!(dirs.len(), 1);
    }

    #[tokio::test]
    async fn test_all_tags_query() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let mut tagged = file("a.txt", "/a.txt");
        tagged.add_tag("archive");
        tagged.add_tag("2024");
        let mut partial = file("b.txt", "/b.txt");
        partial.add_tag("archive");
        repo.add(&tagged, &ctx).await.unwrap();
        repo.add(&partial, &ctx).await.unwrap();

        let both = repo
            .get_by_tags(&["archive".into(), "2024".into()], &ctx)
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, tagged.id);

        let any = repo.get_by_tags(&["archive".into()], &ctx).await.unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn test_non_indexed_lists_only_unindexed_files() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        let plain = file("a.txt", "/a.txt");
        let mut indexed = file("b.txt", "/b.txt");
        indexed.mark_indexed();
        let dir = FileDescriptor::new_directory("d", "/d", None, CorrelationId::generate());
        repo.add(&plain, &ctx).await.unwrap();
        repo.add(&indexed, &ctx).await.unwrap();
        repo.add(&dir, &ctx).await.unwrap();

        let pending = repo.get_non_indexed(&ctx).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, plain.id);
    }

    #[tokio::test]
    async fn test_canceled_context_short_circuits() {
        let repo = repository().await;
        let ctx = OperationContext::new();
        ctx.cancellation().cancel();
        let err = repo.get_all(&ctx).await.unwrap_err();
        assert_eq!(err.category(), "cancellation");
    }
}
