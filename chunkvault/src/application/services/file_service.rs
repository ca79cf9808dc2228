// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Service
//!
//! Thin orchestrator above the chunk manager for the end-to-end operations:
//! upload, download, delete, verify, list. Owns every file-status transition
//! (`Pending -> Processing -> Completed | Failed`).
//!
//! Upload streams the input through a SHA-256 tee ([`HashingReader`]) into
//! the chunk pipeline, so the whole-file checksum and byte count fall out of
//! the same single pass that splits the stream. `checksum`, `size`, and
//! `chunk_count` are written together, once, at finalize; the shared
//! completion evaluation then flips the file to `Completed`.
//!
//! A zero-byte upload finalizes with `chunk_count = 0`, no chunk rows, and
//! the checksum of the empty byte string; downloading it writes nothing.

use crate::application::services::chunk_lifecycle::ChunkLifecycleService;
use crate::application::services::chunk_manager::{ChunkManager, IntegrityReport};
use chunkvault_domain::services::checksum_service::StreamingChecksum;
use chunkvault_domain::{
    EngineError, FileDescriptor, FileId, FileMetadataRepository, FileStatus, OperationContext,
};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{info, warn};

/// `AsyncRead` tee that feeds every byte it passes through into a SHA-256
/// accumulator.
pub struct HashingReader<R> {
    inner: R,
    checksum: StreamingChecksum,
}

impl<R> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        HashingReader {
            inner,
            checksum: StreamingChecksum::new(),
        }
    }

    /// Bytes seen so far
    pub fn bytes_seen(&self) -> u64 {
        self.checksum.bytes_seen()
    }

    /// Consumes the tee and yields the hex digest of everything read
    pub fn finalize(self) -> String {
        self.checksum.finalize()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for HashingReader<R> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        let me = self.get_mut();
        let before = buf.filled().len();
        match Pin::new(&mut me.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                me.checksum.update(&buf.filled()[before..]);
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

/// Upload / download / delete / verify / list orchestration.
pub struct FileService {
    file_repository: Arc<dyn FileMetadataRepository>,
    chunk_manager: Arc<ChunkManager>,
    lifecycle: Arc<ChunkLifecycleService>,
}

impl FileService {
    pub fn new(
        file_repository: Arc<dyn FileMetadataRepository>,
        chunk_manager: Arc<ChunkManager>,
        lifecycle: Arc<ChunkLifecycleService>,
    ) -> Self {
        FileService {
            file_repository,
            chunk_manager,
            lifecycle,
        }
    }

    /// Uploads one file: assigns the ID, splits and stores the content, and
    /// finalizes the descriptor. Returns the descriptor as persisted after
    /// the completion evaluation.
    pub async fn upload_file<R>(
        &self,
        reader: R,
        name: &str,
        full_path: &str,
        size_hint: Option<u64>,
        ctx: &OperationContext,
    ) -> Result<FileDescriptor, EngineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut file = FileDescriptor::new_file(name, full_path, ctx.correlation_id().clone());
        if let Some(size) = size_hint {
            file.size = Some(size);
        }
        self.file_repository.add(&file, ctx).await?;

        file.begin_processing();
        self.file_repository.update(&file, ctx).await?;

        let mut tee = HashingReader::new(reader);
        let manifest = match self
            .chunk_manager
            .store_stream(&mut tee, &file.id, size_hint, ctx)
            .await
        {
            Ok(manifest) => manifest,
            Err(err) => {
                self.fail_file(&mut file, ctx).await;
                return Err(err);
            }
        };

        let total_bytes = tee.bytes_seen();
        let checksum = tee.finalize();
        file.finalize_upload(checksum, total_bytes, manifest.len() as u32);
        if let Err(err) = self.file_repository.update(&file, ctx).await {
            self.fail_file(&mut file, ctx).await;
            return Err(err);
        }

        // Same evaluation the ChunkStored handler runs; here it is the
        // terminal check that converges the finalize/event race.
        self.lifecycle.evaluate_completion(&file.id, ctx).await?;

        let persisted = self
            .file_repository
            .get_by_id(&file.id, ctx)
            .await?
            .unwrap_or(file);
        info!(
            correlation_id = %ctx.correlation_id(),
            file_id = %persisted.id,
            bytes = total_bytes,
            chunks = persisted.chunk_count,
            status = ?persisted.status,
            "upload finished"
        );
        Ok(persisted)
    }

    /// Reassembles a stored file into `sink`. Read-only apart from optional
    /// last-access bookkeeping.
    pub async fn download_file<W>(&self, id: &FileId, sink: &mut W, ctx: &OperationContext) -> Result<bool, EngineError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let file = self.require_file(id, ctx).await?;
        if file.is_directory() {
            return Err(EngineError::validation(format!(
                "{} is a directory; only files can be downloaded",
                id
            )));
        }
        if file.status != FileStatus::Completed {
            return Err(EngineError::validation(format!(
                "{} is not downloadable in status {:?}",
                id, file.status
            )));
        }
        let written = self.chunk_manager.reassemble(&file, sink, ctx).await?;
        info!(
            correlation_id = %ctx.correlation_id(),
            file_id = %id,
            bytes = written,
            "download finished"
        );
        Ok(true)
    }

    /// Deletes a file, its chunk descriptors, and their blobs.
    ///
    /// Idempotent at the file level: deleting a missing file returns true
    /// unless `strict` is requested.
    pub async fn delete_file(&self, id: &FileId, strict: bool, ctx: &OperationContext) -> Result<bool, EngineError> {
        let Some(file) = self.file_repository.get_by_id(id, ctx).await? else {
            if strict {
                return Err(EngineError::not_found(format!("file {} does not exist", id)));
            }
            return Ok(true);
        };

        let removed_chunks = self.chunk_manager.delete_file_chunks(&file.id, ctx).await?;
        self.file_repository.delete(&file.id, ctx).await?;
        info!(
            correlation_id = %ctx.correlation_id(),
            file_id = %id,
            chunks = removed_chunks,
            "file deleted"
        );
        Ok(true)
    }

    /// Runs the integrity check; `deep` reads and re-hashes every chunk.
    pub async fn verify_file_integrity(
        &self,
        id: &FileId,
        deep: bool,
        ctx: &OperationContext,
    ) -> Result<IntegrityReport, EngineError> {
        let file = self.require_file(id, ctx).await?;
        self.chunk_manager.verify(&file, deep, ctx).await
    }

    /// Lists every known descriptor.
    pub async fn list_files(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError> {
        self.file_repository.get_all(ctx).await
    }

    async fn require_file(&self, id: &FileId, ctx: &OperationContext) -> Result<FileDescriptor, EngineError> {
        self.file_repository
            .get_by_id(id, ctx)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("file {} does not exist", id)))
    }

    async fn fail_file(&self, file: &mut FileDescriptor, ctx: &OperationContext) {
        if file.status == FileStatus::Failed {
            return;
        }
        file.mark_failed();
        if let Err(err) = self.file_repository.update(file, ctx).await {
            warn!(
                correlation_id = %ctx.correlation_id(),
                file_id = %file.id,
                error = %err,
                "failed to record Failed status"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkvault_domain::sha256_hex;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_hashing_reader_matches_one_shot_digest() {
        let data = b"tee me through the pipeline".repeat(100);
        let mut tee = HashingReader::new(std::io::Cursor::new(data.clone()));
        let mut sink = Vec::new();
        tee.read_to_end(&mut sink).await.unwrap();

        assert_eq!(sink, data);
        assert_eq!(tee.bytes_seen(), data.len() as u64);
        assert_eq!(tee.finalize(), sha256_hex(&data));
    }

    #[tokio::test]
    async fn test_hashing_reader_empty_input() {
        let mut tee = HashingReader::new(std::io::Cursor::new(Vec::<u8>::new()));
        let mut sink = Vec::new();
        tee.read_to_end(&mut sink).await.unwrap();
        assert_eq!(tee.bytes_seen(), 0);
        assert_eq!(tee.finalize(), sha256_hex(b""));
    }
}
