// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Manager
//!
//! The core of the engine: splits an input stream into chunks, compresses
//! and checksums each one, places it on a provider chosen by the
//! distribution strategy, persists the descriptor, and publishes
//! `ChunkStored` — then reverses the whole dance for reassembly.
//!
//! ## Upload ordering
//!
//! Stream reads are serial (they consume the input) and every sequence
//! number is captured before any concurrent work begins. Compression,
//! checksumming, and provider writes run on a bounded worker pool
//! (`min(8, available_parallelism)` permits) and may complete out of order;
//! the returned manifest is sorted back into read order.
//!
//! ## Failure handling
//!
//! A provider or repository failure on any chunk aborts the upload. Chunks
//! already durable are rolled back best-effort through their recorded
//! providers when `rollback_on_failure` is set (the default); otherwise they
//! are left as orphans pointing at a `Failed` file, reclaimable by a cleanup
//! scan. Cancellation lets in-flight writes finish but starts no new chunk.
//!
//! Every provider call is wrapped in the configured I/O deadline and a
//! timeout surfaces as a [`EngineError::Storage`] like any other provider
//! failure.

use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::providers::ProviderRegistry;
use chunkvault_domain::services::checksum_service::{sha256_hex, StreamingChecksum};
use chunkvault_domain::services::compression_service::{CompressionLevel, CompressionService};
use chunkvault_domain::{
    ChunkDescriptor, ChunkKey, ChunkMetadataRepository, ChunkSizePolicy, ChunkStatus, ChunkStoredEvent,
    DistributionStrategy, EngineError, FileDescriptor, FileId, OperationContext, StorageEvent,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Tuning knobs for the chunk pipeline.
#[derive(Debug, Clone)]
pub struct ChunkManagerConfig {
    pub size_policy: ChunkSizePolicy,
    pub compression_enabled: bool,
    pub compression_level: CompressionLevel,
    /// Roll back already-stored chunks when an upload fails
    pub rollback_on_failure: bool,
    /// Per-provider I/O deadline
    pub io_timeout: Duration,
    /// Concurrent chunk workers; defaults to `min(8, available_parallelism)`
    pub worker_bound: usize,
}

impl Default for ChunkManagerConfig {
    fn default() -> Self {
        ChunkManagerConfig {
            size_policy: ChunkSizePolicy::default(),
            compression_enabled: true,
            compression_level: CompressionLevel::default(),
            rollback_on_failure: true,
            io_timeout: Duration::from_secs(30),
            worker_bound: default_worker_bound(),
        }
    }
}

/// Worker-pool bound: `min(8, available_parallelism)`.
pub fn default_worker_bound() -> usize {
    let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    cores.min(8).max(1)
}

/// Structured result of an integrity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub file_id: String,
    pub deep: bool,
    pub chunks_expected: u32,
    pub chunks_found: u64,
    pub missing_sequences: Vec<u64>,
    pub duplicate_sequences: Vec<u64>,
    /// Sequences whose blob failed checksum or size verification (deep only)
    pub mismatched_sequences: Vec<u64>,
    /// Whole-file hash comparison outcome, when it could be computed
    pub file_checksum_match: Option<bool>,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.missing_sequences.is_empty()
            && self.duplicate_sequences.is_empty()
            && self.mismatched_sequences.is_empty()
            && self.chunks_found == u64::from(self.chunks_expected)
            && self.file_checksum_match != Some(false)
    }

    /// Collapses the report into the error the enclosing operation raises.
    pub fn into_result(self) -> Result<(), EngineError> {
        if self.is_valid() {
            return Ok(());
        }
        if !self.mismatched_sequences.is_empty() {
            return Err(EngineError::integrity(format!(
                "file {}: chunk checksum mismatch at sequence(s) {:?}",
                self.file_id, self.mismatched_sequences
            )));
        }
        if !self.missing_sequences.is_empty() || !self.duplicate_sequences.is_empty() {
            return Err(EngineError::integrity(format!(
                "file {}: broken chunk manifest (missing {:?}, duplicate {:?})",
                self.file_id, self.missing_sequences, self.duplicate_sequences
            )));
        }
        Err(EngineError::integrity(format!(
            "file {}: stored content does not hash to the recorded checksum",
            self.file_id
        )))
    }
}

// Dependencies cloned into each chunk worker task.
#[derive(Clone)]
struct WorkerDeps {
    registry: Arc<ProviderRegistry>,
    strategy: Arc<dyn DistributionStrategy>,
    compression: Arc<dyn CompressionService>,
    chunk_repository: Arc<dyn ChunkMetadataRepository>,
    event_bus: Arc<EventBus>,
    config: ChunkManagerConfig,
}

/// Split / compress / checksum / store / reassemble engine.
pub struct ChunkManager {
    deps: WorkerDeps,
    workers: Arc<Semaphore>,
}

impl ChunkManager {
    pub fn new(
        config: ChunkManagerConfig,
        registry: Arc<ProviderRegistry>,
        strategy: Arc<dyn DistributionStrategy>,
        compression: Arc<dyn CompressionService>,
        chunk_repository: Arc<dyn ChunkMetadataRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(config.worker_bound.max(1)));
        ChunkManager {
            deps: WorkerDeps {
                registry,
                strategy,
                compression,
                chunk_repository,
                event_bus,
                config,
            },
            workers,
        }
    }

    pub fn size_policy(&self) -> &ChunkSizePolicy {
        &self.deps.config.size_policy
    }

    /// Splits `reader` into chunks and stores every one of them.
    ///
    /// Returns the manifest in sequence order, every descriptor `Stored`.
    /// A zero-byte input produces an empty manifest.
    pub async fn store_stream<R>(
        &self,
        reader: &mut R,
        file_id: &FileId,
        total_size_hint: Option<u64>,
        ctx: &OperationContext,
    ) -> Result<Vec<ChunkDescriptor>, EngineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let target = self.deps.config.size_policy.target_for(total_size_hint) as usize;
        let failed = Arc::new(AtomicBool::new(false));
        let mut tasks: JoinSet<Result<ChunkDescriptor, EngineError>> = JoinSet::new();
        let mut read_error: Option<EngineError> = None;
        let mut sequence: u64 = 0;

        loop {
            // No new chunk once cancellation or a worker failure is observed;
            // whatever is in flight is allowed to finish below.
            if ctx.is_canceled() {
                read_error = Some(EngineError::canceled(format!(
                    "upload of {} canceled at chunk {}",
                    file_id, sequence
                )));
                break;
            }
            if failed.load(Ordering::SeqCst) {
                break;
            }

            let buffer = match read_up_to(reader, target).await {
                Ok(buffer) => buffer,
                Err(err) => {
                    read_error = Some(EngineError::Io(format!("chunk read failed: {}", err)));
                    break;
                }
            };
            if buffer.is_empty() {
                break; // EOF
            }

            // Sequence captured — and the provider selected — before any
            // concurrent work begins, so placement follows read order and a
            // fixed strategy counter yields a deterministic layout.
            let job_sequence = sequence;
            sequence += 1;
            let provider = self.deps.strategy.select(self.deps.registry.all())?;

            let permit = self
                .workers
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::internal("chunk worker pool closed"))?;
            let deps = self.deps.clone();
            let failed_flag = failed.clone();
            let task_ctx = ctx.clone();
            let task_file_id = file_id.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = store_one_chunk(&deps, provider, &task_file_id, job_sequence, buffer, &task_ctx).await;
                if result.is_err() {
                    failed_flag.store(true, Ordering::SeqCst);
                }
                result
            });
        }

        // Join every spawned worker; in-flight writes complete either way.
        let mut stored = Vec::new();
        let mut first_error = read_error;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(descriptor)) => stored.push(descriptor),
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(join_err) => {
                    if first_error.is_none() {
                        first_error = Some(EngineError::internal(format!("chunk worker panicked: {}", join_err)));
                    }
                }
            }
        }

        if let Some(err) = first_error {
            if self.deps.config.rollback_on_failure {
                self.rollback_chunks(&stored, ctx).await;
            } else {
                warn!(
                    correlation_id = %ctx.correlation_id(),
                    file_id = %file_id,
                    orphaned = stored.len(),
                    "upload failed, leaving stored chunks for cleanup scan"
                );
            }
            return Err(err);
        }

        stored.sort_by_key(|c| c.sequence_number);
        Ok(stored)
    }

    /// Reassembles a file into `sink`, verifying every chunk on the way.
    ///
    /// Returns the number of plaintext bytes written.
    pub async fn reassemble<W>(
        &self,
        file: &FileDescriptor,
        sink: &mut W,
        ctx: &OperationContext,
    ) -> Result<u64, EngineError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let chunks = self
            .deps
            .chunk_repository
            .get_chunks_by_file_id(&file.id, ctx)
            .await?;
        require_contiguous(&file.id, file.chunk_count, &chunks)?;

        let mut file_hash = StreamingChecksum::new();
        for chunk in &chunks {
            ctx.check_canceled()?;
            let plaintext = self.read_chunk_plaintext(chunk, ctx).await?;
            file_hash.update(&plaintext);
            sink.write_all(&plaintext)
                .await
                .map_err(|e| EngineError::Io(format!("sink write failed: {}", e)))?;
            self.touch_access(chunk, ctx).await;
        }
        sink.flush()
            .await
            .map_err(|e| EngineError::Io(format!("sink flush failed: {}", e)))?;

        let written = file_hash.bytes_seen();
        if let Some(expected) = &file.checksum {
            let actual = file_hash.finalize();
            if &actual != expected {
                return Err(EngineError::integrity(format!(
                    "file {}: reassembled content hashes to {} but descriptor records {}",
                    file.id, actual, expected
                )));
            }
        }
        Ok(written)
    }

    /// Integrity check: shallow (metadata only) or deep (full read).
    pub async fn verify(
        &self,
        file: &FileDescriptor,
        deep: bool,
        ctx: &OperationContext,
    ) -> Result<IntegrityReport, EngineError> {
        let chunks = self
            .deps
            .chunk_repository
            .get_chunks_by_file_id(&file.id, ctx)
            .await?;

        let mut report = IntegrityReport {
            file_id: file.id.to_string(),
            deep,
            chunks_expected: file.chunk_count,
            chunks_found: chunks.len() as u64,
            missing_sequences: Vec::new(),
            duplicate_sequences: Vec::new(),
            mismatched_sequences: Vec::new(),
            file_checksum_match: None,
        };

        let mut seen = vec![false; file.chunk_count as usize];
        for chunk in &chunks {
            let seq = chunk.sequence_number as usize;
            if seq >= seen.len() {
                report.duplicate_sequences.push(chunk.sequence_number);
                continue;
            }
            if seen[seq] {
                report.duplicate_sequences.push(chunk.sequence_number);
            }
            seen[seq] = true;
            if chunk.status != ChunkStatus::Stored {
                report.missing_sequences.push(chunk.sequence_number);
            }
        }
        for (seq, present) in seen.iter().enumerate() {
            if !present {
                report.missing_sequences.push(seq as u64);
            }
        }

        if deep && report.missing_sequences.is_empty() && report.duplicate_sequences.is_empty() {
            let mut file_hash = StreamingChecksum::new();
            for chunk in &chunks {
                ctx.check_canceled()?;
                match self.read_chunk_plaintext(chunk, ctx).await {
                    Ok(plaintext) => file_hash.update(&plaintext),
                    Err(err) => {
                        debug!(
                            correlation_id = %ctx.correlation_id(),
                            chunk_id = %chunk.id,
                            error = %err,
                            "deep verify: chunk failed"
                        );
                        report.mismatched_sequences.push(chunk.sequence_number);
                    }
                }
            }
            if report.mismatched_sequences.is_empty() {
                if let Some(expected) = &file.checksum {
                    report.file_checksum_match = Some(&file_hash.finalize() == expected);
                }
            }
        }

        Ok(report)
    }

    /// Deletes every chunk of a file: blobs (best-effort, idempotent), then
    /// descriptors. Returns the number of descriptors removed.
    pub async fn delete_file_chunks(&self, file_id: &FileId, ctx: &OperationContext) -> Result<u64, EngineError> {
        let chunks = self.deps.chunk_repository.get_chunks_by_file_id(file_id, ctx).await?;
        for chunk in &chunks {
            self.delete_blob(chunk, ctx).await;
        }
        self.deps.chunk_repository.delete_chunks_by_file_id(file_id, ctx).await
    }

    async fn read_chunk_plaintext(
        &self,
        chunk: &ChunkDescriptor,
        ctx: &OperationContext,
    ) -> Result<Vec<u8>, EngineError> {
        let provider = self.deps.registry.resolve(&chunk.storage_provider_id)?;
        let key = chunk.key();
        let blob = with_io_timeout(
            self.deps.config.io_timeout,
            provider.provider_id(),
            "read",
            provider.read_chunk(&key, &chunk.storage_path, ctx),
        )
        .await?;

        let plaintext = if chunk.is_compressed {
            // A blob that no longer decompresses is corruption, not I/O.
            self.deps.compression.decompress(&blob).map_err(|e| {
                EngineError::integrity(format!("chunk {}: stored blob failed to decompress: {}", chunk.id, e))
            })?
        } else {
            blob
        };

        if plaintext.len() as u64 != chunk.size {
            return Err(EngineError::integrity(format!(
                "chunk {}: expected {} plaintext bytes, got {}",
                chunk.id,
                chunk.size,
                plaintext.len()
            )));
        }
        if sha256_hex(&plaintext) != chunk.checksum {
            return Err(EngineError::integrity(format!(
                "chunk {}: plaintext does not hash to the recorded checksum",
                chunk.id
            )));
        }
        Ok(plaintext)
    }

    // Best-effort lastAccessTime update; failures only logged.
    async fn touch_access(&self, chunk: &ChunkDescriptor, ctx: &OperationContext) {
        let mut touched = chunk.clone();
        touched.record_access();
        if let Err(err) = self.deps.chunk_repository.update(&touched, ctx).await {
            debug!(
                correlation_id = %ctx.correlation_id(),
                chunk_id = %chunk.id,
                error = %err,
                "last access update failed"
            );
        }
    }

    async fn delete_blob(&self, chunk: &ChunkDescriptor, ctx: &OperationContext) {
        let provider = match self.deps.registry.resolve(&chunk.storage_provider_id) {
            Ok(provider) => provider,
            Err(err) => {
                warn!(
                    correlation_id = %ctx.correlation_id(),
                    chunk_id = %chunk.id,
                    error = %err,
                    "blob delete skipped, provider unresolvable"
                );
                return;
            }
        };
        let key = chunk.key();
        let result = with_io_timeout(
            self.deps.config.io_timeout,
            provider.provider_id(),
            "delete",
            provider.delete_chunk(&key, &chunk.storage_path, ctx),
        )
        .await;
        if let Err(err) = result {
            warn!(
                correlation_id = %ctx.correlation_id(),
                chunk_id = %chunk.id,
                error = %err,
                "blob delete failed, continuing"
            );
        }
    }

    async fn rollback_chunks(&self, stored: &[ChunkDescriptor], ctx: &OperationContext) {
        debug!(
            correlation_id = %ctx.correlation_id(),
            chunks = stored.len(),
            "rolling back stored chunks after failed upload"
        );
        for chunk in stored {
            self.delete_blob(chunk, ctx).await;
            if let Err(err) = self.deps.chunk_repository.delete(&chunk.id, ctx).await {
                warn!(
                    correlation_id = %ctx.correlation_id(),
                    chunk_id = %chunk.id,
                    error = %err,
                    "rollback: descriptor delete failed"
                );
            }
        }
    }
}

// One chunk through the pipeline: checksum, compress, write, persist, publish.
async fn store_one_chunk(
    deps: &WorkerDeps,
    provider: Arc<dyn chunkvault_domain::StorageProvider>,
    file_id: &FileId,
    sequence: u64,
    plaintext: Vec<u8>,
    ctx: &OperationContext,
) -> Result<ChunkDescriptor, EngineError> {
    let checksum = sha256_hex(&plaintext);
    let mut descriptor = ChunkDescriptor::new(
        file_id.clone(),
        sequence,
        plaintext.len() as u64,
        checksum,
        ctx.correlation_id().clone(),
    );

    // Keep the compressed form only when it actually shrinks the chunk.
    let blob = if deps.config.compression_enabled {
        let compressed = deps.compression.compress(&plaintext, deps.config.compression_level)?;
        if compressed.len() < plaintext.len() {
            descriptor = descriptor.with_compression(compressed.len() as u64);
            compressed
        } else {
            plaintext
        }
    } else {
        plaintext
    };

    let key = ChunkKey::new(file_id, sequence);
    let storage_path = with_io_timeout(
        deps.config.io_timeout,
        provider.provider_id(),
        "write",
        provider.write_chunk(&key, &blob, ctx),
    )
    .await?;

    descriptor.mark_stored(provider.provider_id(), storage_path);
    deps.chunk_repository.add(&descriptor, ctx).await?;
    deps.event_bus
        .publish(&StorageEvent::ChunkStored(ChunkStoredEvent::new(
            descriptor.id.clone(),
            file_id,
            sequence,
            descriptor.storage_provider_id.clone(),
            descriptor.compressed_size,
            ctx.correlation_id().clone(),
        )))
        .await;

    debug!(
        correlation_id = %ctx.correlation_id(),
        chunk_id = %descriptor.id,
        provider = %descriptor.storage_provider_id,
        size = descriptor.size,
        compressed = descriptor.is_compressed,
        "chunk stored"
    );
    Ok(descriptor)
}

async fn with_io_timeout<T>(
    deadline: Duration,
    provider_id: &str,
    action: &str,
    future: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::storage(
            provider_id,
            format!("{} timed out after {:?}", action, deadline),
        )),
    }
}

// Fills a buffer with up to `target` bytes; short only at EOF.
async fn read_up_to<R: AsyncRead + Unpin>(reader: &mut R, target: usize) -> std::io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; target];
    let mut filled = 0;
    while filled < target {
        let read = reader.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buffer.truncate(filled);
    Ok(buffer)
}

fn require_contiguous(file_id: &FileId, expected: u32, chunks: &[ChunkDescriptor]) -> Result<(), EngineError> {
    if chunks.len() != expected as usize {
        return Err(EngineError::integrity(format!(
            "file {}: manifest has {} chunks, descriptor records {}",
            file_id,
            chunks.len(),
            expected
        )));
    }
    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.sequence_number != index as u64 {
            return Err(EngineError::integrity(format!(
                "file {}: manifest is not contiguous at position {} (found sequence {})",
                file_id, index, chunk.sequence_number
            )));
        }
        if chunk.status != ChunkStatus::Stored {
            return Err(EngineError::integrity(format!(
                "file {}: chunk {} is not in Stored state",
                file_id, chunk.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkvault_domain::CorrelationId;

    #[test]
    fn test_default_worker_bound_is_capped() {
        let bound = default_worker_bound();
        assert!(bound >= 1);
        assert!(bound <= 8);
    }

    #[test]
    fn test_contiguity_check_rejects_gaps() {
        let file_id = FileId::generate();
        let make = |seq: u64| {
            let mut c = ChunkDescriptor::new(file_id.clone(), seq, 1, "00".repeat(32), CorrelationId::generate());
            c.mark_stored("fs", "p");
            c
        };
        assert!(require_contiguous(&file_id, 2, &[make(0), make(1)]).is_ok());
        assert!(require_contiguous(&file_id, 2, &[make(0), make(2)]).is_err());
        assert!(require_contiguous(&file_id, 3, &[make(0), make(1)]).is_err());
    }

    #[test]
    fn test_report_validity_and_error_naming() {
        let report = IntegrityReport {
            file_id: "f".into(),
            deep: true,
            chunks_expected: 3,
            chunks_found: 3,
            missing_sequences: vec![],
            duplicate_sequences: vec![],
            mismatched_sequences: vec![1],
            file_checksum_match: None,
        };
        assert!(!report.is_valid());
        let err = report.into_result().unwrap_err();
        assert_eq!(err.category(), "integrity");
        assert!(err.to_string().contains('1'));
    }

    #[tokio::test]
    async fn test_read_up_to_fills_and_terminates() {
        let data = vec![1u8; 10];
        let mut reader = std::io::Cursor::new(data);
        let first = read_up_to(&mut reader, 4).await.unwrap();
        assert_eq!(first.len(), 4);
        let second = read_up_to(&mut reader, 4).await.unwrap();
        assert_eq!(second.len(), 4);
        let tail = read_up_to(&mut reader, 4).await.unwrap();
        assert_eq!(tail.len(), 2);
        let eof = read_up_to(&mut reader, 4).await.unwrap();
        assert!(eof.is_empty());
    }
}
