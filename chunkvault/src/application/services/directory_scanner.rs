// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Directory Scanner
//!
//! Recursive filesystem traversal that creates or refreshes descriptors for
//! every directory and file it meets. With `process_content` set, each file
//! is streamed through the upload pipeline; otherwise only metadata is
//! recorded.
//!
//! Directory descent is serial so a parent's ID is always known before its
//! children are processed. File content processing optionally runs on a
//! bounded worker pool (`min(8, available_parallelism)`); per-file failures
//! are accumulated into the [`ScanProgress`] report and never abort the
//! scan. Progress is pushed to the optional reporter at a configurable
//! interval and once more at the end.

use crate::application::services::file_service::FileService;
use crate::infrastructure::event_bus::EventBus;
use chunkvault_domain::{
    DirectoryScanEvent, EngineError, FileDescriptor, FileDiscoveredEvent, FileId, FileMetadataRepository, FileStatus,
    OperationContext, StorageEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// One file that could not be scanned or processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanError {
    pub path: String,
    pub message: String,
}

/// Running tallies of a scan, returned as its final report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanProgress {
    pub root_path: String,
    pub directories_seen: u64,
    pub files_seen: u64,
    /// Files whose content went through the upload pipeline
    pub files_processed: u64,
    pub bytes_seen: u64,
    pub errors: Vec<ScanError>,
}

/// Receives progress snapshots during a scan.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: &ScanProgress);
}

/// Reporter that logs each snapshot.
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn report(&self, progress: &ScanProgress) {
        info!(
            root = %progress.root_path,
            directories = progress.directories_seen,
            files = progress.files_seen,
            processed = progress.files_processed,
            bytes = progress.bytes_seen,
            errors = progress.errors.len(),
            "scan progress"
        );
    }
}

/// Scan behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub recursive: bool,
    pub process_content: bool,
    /// Process file contents on the bounded worker pool
    pub parallel: bool,
}

struct FileOutcome {
    bytes: u64,
    processed: bool,
}

/// Recursive traversal + optional content processing.
pub struct DirectoryScanner {
    file_repository: Arc<dyn FileMetadataRepository>,
    file_service: Arc<FileService>,
    event_bus: Arc<EventBus>,
    workers: Arc<Semaphore>,
    flush_interval: Duration,
}

impl DirectoryScanner {
    pub fn new(
        file_repository: Arc<dyn FileMetadataRepository>,
        file_service: Arc<FileService>,
        event_bus: Arc<EventBus>,
        worker_bound: usize,
        flush_interval: Duration,
    ) -> Self {
        DirectoryScanner {
            file_repository,
            file_service,
            event_bus,
            workers: Arc::new(Semaphore::new(worker_bound.max(1))),
            flush_interval,
        }
    }

    /// Walks `root`, registering directories and files.
    pub async fn scan(
        &self,
        root: &Path,
        options: ScanOptions,
        reporter: Option<Arc<dyn ProgressReporter>>,
        ctx: &OperationContext,
    ) -> Result<ScanProgress, EngineError> {
        let mut progress = ScanProgress {
            root_path: root.display().to_string(),
            ..ScanProgress::default()
        };
        let mut last_flush = Instant::now();

        let root_id = self.register_directory(root, None, ctx).await?;
        progress.directories_seen += 1;

        // Serial descent: a directory is expanded only after its descriptor
        // exists, so children always know their parent ID.
        let mut pending: VecDeque<(PathBuf, FileId)> = VecDeque::new();
        pending.push_back((root.to_path_buf(), root_id));

        while let Some((dir_path, dir_id)) = pending.pop_front() {
            ctx.check_canceled()?;

            let mut entries = match tokio::fs::read_dir(&dir_path).await {
                Ok(entries) => entries,
                Err(err) => {
                    progress.errors.push(ScanError {
                        path: dir_path.display().to_string(),
                        message: format!("read_dir failed: {}", err),
                    });
                    continue;
                }
            };

            let mut files: Vec<PathBuf> = Vec::new();
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        let path = entry.path();
                        match entry.file_type().await {
                            Ok(file_type) if file_type.is_dir() => {
                                match self.register_directory(&path, Some(dir_id.clone()), ctx).await {
                                    Ok(child_id) => {
                                        progress.directories_seen += 1;
                                        if options.recursive {
                                            pending.push_back((path, child_id));
                                        }
                                    }
                                    Err(err) => progress.errors.push(ScanError {
                                        path: path.display().to_string(),
                                        message: err.to_string(),
                                    }),
                                }
                            }
                            Ok(file_type) if file_type.is_file() => files.push(path),
                            Ok(_) => debug!(path = %path.display(), "skipping non-regular entry"),
                            Err(err) => progress.errors.push(ScanError {
                                path: path.display().to_string(),
                                message: format!("file_type failed: {}", err),
                            }),
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        progress.errors.push(ScanError {
                            path: dir_path.display().to_string(),
                            message: format!("directory iteration failed: {}", err),
                        });
                        break;
                    }
                }
            }

            if options.parallel && options.process_content {
                self.process_files_parallel(&files, &dir_id, options, &mut progress, ctx)
                    .await;
            } else {
                for path in &files {
                    if ctx.is_canceled() {
                        break;
                    }
                    let result = self.process_file(path, &dir_id, options, ctx).await;
                    Self::absorb_outcome(path, result, &mut progress);
                }
            }

            if let Some(reporter) = &reporter {
                if last_flush.elapsed() >= self.flush_interval {
                    reporter.report(&progress);
                    last_flush = Instant::now();
                }
            }
        }

        ctx.check_canceled()?;
        self.event_bus
            .publish(&StorageEvent::DirectoryScan(DirectoryScanEvent::new(
                progress.root_path.clone(),
                progress.directories_seen,
                progress.files_seen,
                progress.errors.len() as u64,
                ctx.correlation_id().clone(),
            )))
            .await;
        if let Some(reporter) = &reporter {
            reporter.report(&progress);
        }
        Ok(progress)
    }

    async fn process_files_parallel(
        &self,
        files: &[PathBuf],
        parent_id: &FileId,
        options: ScanOptions,
        progress: &mut ScanProgress,
        ctx: &OperationContext,
    ) {
        let mut tasks: JoinSet<(PathBuf, Result<FileOutcome, EngineError>)> = JoinSet::new();
        for path in files {
            if ctx.is_canceled() {
                break;
            }
            let Ok(permit) = self.workers.clone().acquire_owned().await else {
                break;
            };
            let scanner = self.clone_for_task();
            let task_path = path.clone();
            let task_parent = parent_id.clone();
            let task_ctx = ctx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = scanner.process_file(&task_path, &task_parent, options, &task_ctx).await;
                (task_path, result)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, result)) => Self::absorb_outcome(&path, result, progress),
                Err(err) => progress.errors.push(ScanError {
                    path: String::new(),
                    message: format!("scan worker panicked: {}", err),
                }),
            }
        }
    }

    fn absorb_outcome(path: &Path, result: Result<FileOutcome, EngineError>, progress: &mut ScanProgress) {
        match result {
            Ok(outcome) => {
                progress.files_seen += 1;
                progress.bytes_seen += outcome.bytes;
                if outcome.processed {
                    progress.files_processed += 1;
                }
            }
            Err(err) => progress.errors.push(ScanError {
                path: path.display().to_string(),
                message: err.to_string(),
            }),
        }
    }

    // Cheap handle for worker tasks; every field is an Arc.
    fn clone_for_task(&self) -> DirectoryScanner {
        DirectoryScanner {
            file_repository: self.file_repository.clone(),
            file_service: self.file_service.clone(),
            event_bus: self.event_bus.clone(),
            workers: self.workers.clone(),
            flush_interval: self.flush_interval,
        }
    }

    async fn register_directory(
        &self,
        path: &Path,
        parent_id: Option<FileId>,
        ctx: &OperationContext,
    ) -> Result<FileId, EngineError> {
        let full_path = path.display().to_string();
        if let Some(existing) = self.file_repository.get_by_full_path(&full_path, ctx).await? {
            return Ok(existing.id);
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&full_path)
            .to_string();
        let descriptor = FileDescriptor::new_directory(name, full_path, parent_id, ctx.correlation_id().clone());
        self.file_repository.add(&descriptor, ctx).await?;
        Ok(descriptor.id)
    }

    async fn process_file(
        &self,
        path: &Path,
        parent_id: &FileId,
        options: ScanOptions,
        ctx: &OperationContext,
    ) -> Result<FileOutcome, EngineError> {
        ctx.check_canceled()?;
        let full_path = path.display().to_string();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| EngineError::Io(format!("stat '{}' failed: {}", full_path, e)))?;
        let size = metadata.len();
        let existing = self.file_repository.get_by_full_path(&full_path, ctx).await?;

        if !options.process_content {
            self.register_file_metadata(path, &full_path, parent_id, size, existing, ctx)
                .await?;
            return Ok(FileOutcome {
                bytes: size,
                processed: false,
            });
        }

        // Content already stored and unchanged: leave it alone.
        if let Some(descriptor) = &existing {
            if descriptor.status == FileStatus::Completed && descriptor.size == Some(size) {
                debug!(
                    correlation_id = %ctx.correlation_id(),
                    path = %full_path,
                    "unchanged since last scan"
                );
                return Ok(FileOutcome {
                    bytes: size,
                    processed: false,
                });
            }
            // Stale or partial: replace it wholesale.
            self.file_service.delete_file(&descriptor.id, false, ctx).await?;
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&full_path)
            .to_string();
        let reader = tokio::fs::File::open(path)
            .await
            .map_err(|e| EngineError::Io(format!("open '{}' failed: {}", full_path, e)))?;
        let mut uploaded = self
            .file_service
            .upload_file(reader, &name, &full_path, Some(size), ctx)
            .await?;

        uploaded.parent_id = Some(parent_id.clone());
        uploaded.mark_indexed();
        if let Err(err) = self.file_repository.update(&uploaded, ctx).await {
            warn!(
                correlation_id = %ctx.correlation_id(),
                file_id = %uploaded.id,
                error = %err,
                "post-upload descriptor refresh failed"
            );
        }

        self.event_bus
            .publish(&StorageEvent::FileDiscovered(FileDiscoveredEvent::new(
                &uploaded.id,
                full_path,
                size,
                true,
                ctx.correlation_id().clone(),
            )))
            .await;
        Ok(FileOutcome {
            bytes: size,
            processed: true,
        })
    }

    async fn register_file_metadata(
        &self,
        path: &Path,
        full_path: &str,
        parent_id: &FileId,
        size: u64,
        existing: Option<FileDescriptor>,
        ctx: &OperationContext,
    ) -> Result<(), EngineError> {
        let descriptor = match existing {
            Some(mut descriptor) => {
                descriptor.size = Some(size);
                descriptor.parent_id = Some(parent_id.clone());
                descriptor.mark_indexed();
                self.file_repository.update(&descriptor, ctx).await?;
                descriptor
            }
            None => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(full_path)
                    .to_string();
                let mut descriptor =
                    FileDescriptor::new_file(name, full_path, ctx.correlation_id().clone()).with_parent(parent_id.clone());
                descriptor.size = Some(size);
                descriptor.mark_indexed();
                self.file_repository.add(&descriptor, ctx).await?;
                descriptor
            }
        };

        self.event_bus
            .publish(&StorageEvent::FileDiscovered(FileDiscoveredEvent::new(
                &descriptor.id,
                full_path.to_string(),
                size,
                false,
                ctx.correlation_id().clone(),
            )))
            .await;
        Ok(())
    }
}
