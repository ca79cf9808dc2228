// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Lifecycle
//!
//! Drives a file's transition to `Completed` by observing `ChunkStored`
//! events. Two handlers are registered for the event: a trivial logging
//! handler and the lifecycle handler — their coexistence is deliberate, it
//! exercises the bus's handler isolation.
//!
//! ## Completion evaluation
//!
//! The evaluation trusts the event's `file_id` and falls back to parsing the
//! chunk key (`"{file_id}_{sequence}"`) only when the event field is empty.
//! `chunk_count` is written exactly once at upload finalize, so the check is
//! simple: a file still `Processing` whose finalized `chunk_count` equals
//! the number of `Stored` chunks becomes `Completed` and `FileProcessed` is
//! published. The evaluation is idempotent — a `ChunkStored` event that
//! lands before finalize sees `chunk_count == 0` with no recorded checksum
//! and does nothing; the upload path re-runs the evaluation after finalize,
//! so the race converges instead of wedging.

use crate::infrastructure::event_bus::{EventBus, EventHandler};
use async_trait::async_trait;
use chunkvault_domain::{
    ChunkKey, ChunkMetadataRepository, ChunkStatus, EngineError, FileId, FileMetadataRepository, FileProcessedEvent,
    FileStatus, OperationContext, StorageEvent,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Completion evaluation shared by the event handler and the upload path.
pub struct ChunkLifecycleService {
    file_repository: Arc<dyn FileMetadataRepository>,
    chunk_repository: Arc<dyn ChunkMetadataRepository>,
    event_bus: Arc<EventBus>,
}

impl ChunkLifecycleService {
    pub fn new(
        file_repository: Arc<dyn FileMetadataRepository>,
        chunk_repository: Arc<dyn ChunkMetadataRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        ChunkLifecycleService {
            file_repository,
            chunk_repository,
            event_bus,
        }
    }

    /// Checks whether every expected chunk of `file_id` is durable and, when
    /// so, completes the file and publishes `FileProcessed`.
    ///
    /// Returns true iff the file is `Completed` after the call. Idempotent.
    pub async fn evaluate_completion(&self, file_id: &FileId, ctx: &OperationContext) -> Result<bool, EngineError> {
        let Some(mut file) = self.file_repository.get_by_id(file_id, ctx).await? else {
            debug!(correlation_id = %ctx.correlation_id(), file_id = %file_id, "completion check: no descriptor");
            return Ok(false);
        };

        match file.status {
            FileStatus::Completed => return Ok(true),
            FileStatus::Error | FileStatus::Failed => return Ok(false),
            FileStatus::Pending | FileStatus::Processing => {}
        }

        // Not finalized yet: chunk_count is written once, together with the
        // whole-file checksum. An empty file finalizes with zero chunks.
        if file.checksum.is_none() {
            return Ok(false);
        }

        let stored = if file.chunk_count == 0 {
            0
        } else {
            self.chunk_repository
                .get_chunks_by_file_id(file_id, ctx)
                .await?
                .iter()
                .filter(|chunk| chunk.status == ChunkStatus::Stored)
                .count() as u32
        };

        if stored != file.chunk_count {
            debug!(
                correlation_id = %ctx.correlation_id(),
                file_id = %file_id,
                stored,
                expected = file.chunk_count,
                "completion check: chunks still outstanding"
            );
            return Ok(false);
        }

        file.mark_completed();
        self.file_repository.update(&file, ctx).await?;
        let total_bytes = file.size.unwrap_or(0);
        self.event_bus
            .publish(&StorageEvent::FileProcessed(FileProcessedEvent::new(
                file_id,
                file.chunk_count,
                total_bytes,
                ctx.correlation_id().clone(),
            )))
            .await;
        info!(
            correlation_id = %ctx.correlation_id(),
            file_id = %file_id,
            chunks = file.chunk_count,
            bytes = total_bytes,
            "file completed"
        );
        Ok(true)
    }
}

/// Trivial observer: logs every stored chunk.
pub struct ChunkStoredLogHandler;

#[async_trait]
impl EventHandler for ChunkStoredLogHandler {
    fn name(&self) -> &str {
        "chunk-stored-log"
    }

    async fn handle(&self, event: &StorageEvent) -> Result<(), EngineError> {
        if let StorageEvent::ChunkStored(chunk) = event {
            debug!(
                correlation_id = %chunk.correlation_id,
                chunk_id = %chunk.chunk_id,
                provider = %chunk.storage_provider_id,
                compressed_size = chunk.compressed_size,
                "chunk stored"
            );
        }
        Ok(())
    }
}

/// Lifecycle observer: runs the completion evaluation on every stored chunk.
pub struct ChunkLifecycleHandler {
    lifecycle: Arc<ChunkLifecycleService>,
}

impl ChunkLifecycleHandler {
    pub fn new(lifecycle: Arc<ChunkLifecycleService>) -> Self {
        ChunkLifecycleHandler { lifecycle }
    }
}

#[async_trait]
impl EventHandler for ChunkLifecycleHandler {
    fn name(&self) -> &str {
        "chunk-lifecycle"
    }

    async fn handle(&self, event: &StorageEvent) -> Result<(), EngineError> {
        let StorageEvent::ChunkStored(chunk) = event else {
            return Ok(());
        };

        // The event's file_id is authoritative; the chunk-key convention is
        // the recovery path for events that lost it.
        let file_id = if chunk.file_id.trim().is_empty() {
            ChunkKey::parse(&chunk.chunk_id)?.0
        } else {
            FileId::parse(chunk.file_id.clone())?
        };

        let ctx = OperationContext::with_correlation_id(chunk.correlation_id.clone());
        self.lifecycle.evaluate_completion(&file_id, &ctx).await?;
        Ok(())
    }
}
