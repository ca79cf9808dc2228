// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Storage Provider
//!
//! Stores each chunk as a regular file under a configured root. The relative
//! path is sharded on the first bytes of the key's SHA-256
//! (`"{aa}/{bb}/{key}"`) so a large vault never piles every blob into one
//! directory; the returned `storage_path` is that relative path, making the
//! layout deterministic given the descriptor alone.
//!
//! Writes are atomic per chunk: bytes land in a temp file next to the final
//! location and are renamed into place, so a reader either finds the full
//! blob or nothing.

use async_trait::async_trait;
use chunkvault_domain::services::checksum_service::sha256_hex;
use chunkvault_domain::{ChunkKey, EngineError, OperationContext, StorageProvider};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Chunk-blob backend over the local filesystem.
pub struct FilesystemProvider {
    provider_id: String,
    root: PathBuf,
}

impl FilesystemProvider {
    /// Creates a provider rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(provider_id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        FilesystemProvider {
            provider_id: provider_id.into(),
            root: root.into(),
        }
    }

    fn relative_path(&self, key: &ChunkKey) -> String {
        let digest = sha256_hex(key.as_str().as_bytes());
        format!("{}/{}/{}", &digest[0..2], &digest[2..4], key)
    }

    fn absolute(&self, storage_path: &str) -> PathBuf {
        self.root.join(storage_path)
    }

    fn io_error(&self, action: &str, path: &Path, err: std::io::Error) -> EngineError {
        EngineError::storage(
            &self.provider_id,
            format!("{} '{}' failed: {}", action, path.display(), err),
        )
    }
}

#[async_trait]
impl StorageProvider for FilesystemProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn kind(&self) -> &str {
        "filesystem"
    }

    async fn write_chunk(&self, key: &ChunkKey, data: &[u8], ctx: &OperationContext) -> Result<String, EngineError> {
        let storage_path = self.relative_path(key);
        let target = self.absolute(&storage_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error("create_dir_all", parent, e))?;
        }

        // Temp file + rename keeps the write atomic on the same filesystem.
        let temp = target.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        tokio::fs::write(&temp, data)
            .await
            .map_err(|e| self.io_error("write", &temp, e))?;
        if let Err(err) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.io_error("rename", &target, err));
        }

        debug!(
            correlation_id = %ctx.correlation_id(),
            provider = %self.provider_id,
            key = %key,
            bytes = data.len(),
            "chunk written"
        );
        Ok(storage_path)
    }

    async fn read_chunk(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<Vec<u8>, EngineError> {
        let target = self.absolute(storage_path);
        let data = tokio::fs::read(&target)
            .await
            .map_err(|e| self.io_error("read", &target, e))?;
        debug!(
            correlation_id = %ctx.correlation_id(),
            provider = %self.provider_id,
            key = %key,
            bytes = data.len(),
            "chunk read"
        );
        Ok(data)
    }

    async fn chunk_exists(
        &self,
        _key: &ChunkKey,
        storage_path: &str,
        _ctx: &OperationContext,
    ) -> Result<bool, EngineError> {
        let target = self.absolute(storage_path);
        match tokio::fs::metadata(&target).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.io_error("stat", &target, err)),
        }
    }

    async fn delete_chunk(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<bool, EngineError> {
        let target = self.absolute(storage_path);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!(
                    correlation_id = %ctx.correlation_id(),
                    provider = %self.provider_id,
                    key = %key,
                    "chunk deleted"
                );
                Ok(true)
            }
            // Idempotent: a missing blob counts as deleted.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(err) => Err(self.io_error("remove", &target, err)),
        }
    }
}
