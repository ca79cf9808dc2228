// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command Handlers & Engine Dispatcher
//!
//! The terminal stage of each command pipeline, one handler per command
//! type, and [`EngineDispatcher`] — the startup-composed set of pipelines
//! the presentation layer talks to.
//!
//! Every handler builds its [`OperationContext`] from the command's
//! correlation ID plus the process-wide cancellation flag, so a SIGINT
//! observed by the bootstrap layer propagates into every repository and
//! provider call of the running command.

use crate::application::commands::{
    DeleteFileCommand, DownloadFileCommand, ListFilesCommand, ScanDirectoryCommand, UploadFileCommand,
    VerifyFileCommand,
};
use crate::application::dispatcher::{CommandHandler, CommandMiddleware, CommandPipeline};
use crate::application::middleware::{LoggingMiddleware, PerformanceMiddleware, ValidationMiddleware};
use crate::application::services::chunk_manager::IntegrityReport;
use crate::application::services::directory_scanner::{
    DirectoryScanner, LogProgressReporter, ProgressReporter, ScanOptions, ScanProgress,
};
use crate::application::services::file_service::FileService;
use async_trait::async_trait;
use chunkvault_domain::{CancellationFlag, CorrelationId, EngineError, FileDescriptor, FileId, OperationContext};
use std::sync::Arc;

fn context(correlation_id: &CorrelationId, cancellation: &CancellationFlag) -> OperationContext {
    OperationContext::with_cancellation(correlation_id.clone(), cancellation.clone())
}

/// Handles `UploadFile`: opens the source and streams it through the
/// pipeline.
pub struct UploadFileHandler {
    file_service: Arc<FileService>,
    cancellation: CancellationFlag,
}

impl UploadFileHandler {
    pub fn new(file_service: Arc<FileService>, cancellation: CancellationFlag) -> Self {
        UploadFileHandler {
            file_service,
            cancellation,
        }
    }
}

#[async_trait]
impl CommandHandler<UploadFileCommand> for UploadFileHandler {
    async fn handle(&self, command: UploadFileCommand) -> Result<FileDescriptor, EngineError> {
        let ctx = context(&command.correlation_id, &self.cancellation);
        let name = command
            .file_name
            .as_deref()
            .ok_or_else(|| EngineError::validation("UploadFile: file name is required"))?;
        let metadata = tokio::fs::metadata(&command.source_path)
            .await
            .map_err(|e| EngineError::Io(format!("stat '{}' failed: {}", command.source_path.display(), e)))?;
        if !metadata.is_file() {
            return Err(EngineError::validation(format!(
                "'{}' is not a regular file",
                command.source_path.display()
            )));
        }
        let reader = tokio::fs::File::open(&command.source_path)
            .await
            .map_err(|e| EngineError::Io(format!("open '{}' failed: {}", command.source_path.display(), e)))?;
        self.file_service
            .upload_file(
                reader,
                name,
                &command.source_path.display().to_string(),
                Some(metadata.len()),
                &ctx,
            )
            .await
    }
}

/// Handles `DownloadFile`: reassembles into the output path.
pub struct DownloadFileHandler {
    file_service: Arc<FileService>,
    cancellation: CancellationFlag,
}

impl DownloadFileHandler {
    pub fn new(file_service: Arc<FileService>, cancellation: CancellationFlag) -> Self {
        DownloadFileHandler {
            file_service,
            cancellation,
        }
    }
}

#[async_trait]
impl CommandHandler<DownloadFileCommand> for DownloadFileHandler {
    async fn handle(&self, command: DownloadFileCommand) -> Result<bool, EngineError> {
        let ctx = context(&command.correlation_id, &self.cancellation);
        let file_id = FileId::parse(command.file_id.clone())?;
        if let Some(parent) = command.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| EngineError::Io(format!("create '{}' failed: {}", parent.display(), e)))?;
            }
        }
        let mut sink = tokio::fs::File::create(&command.output_path)
            .await
            .map_err(|e| EngineError::Io(format!("create '{}' failed: {}", command.output_path.display(), e)))?;
        self.file_service.download_file(&file_id, &mut sink, &ctx).await
    }
}

/// Handles `DeleteFile`.
pub struct DeleteFileHandler {
    file_service: Arc<FileService>,
    cancellation: CancellationFlag,
}

impl DeleteFileHandler {
    pub fn new(file_service: Arc<FileService>, cancellation: CancellationFlag) -> Self {
        DeleteFileHandler {
            file_service,
            cancellation,
        }
    }
}

#[async_trait]
impl CommandHandler<DeleteFileCommand> for DeleteFileHandler {
    async fn handle(&self, command: DeleteFileCommand) -> Result<bool, EngineError> {
        let ctx = context(&command.correlation_id, &self.cancellation);
        let file_id = FileId::parse(command.file_id.clone())?;
        self.file_service.delete_file(&file_id, command.strict, &ctx).await
    }
}

/// Handles `VerifyFile`.
pub struct VerifyFileHandler {
    file_service: Arc<FileService>,
    cancellation: CancellationFlag,
}

impl VerifyFileHandler {
    pub fn new(file_service: Arc<FileService>, cancellation: CancellationFlag) -> Self {
        VerifyFileHandler {
            file_service,
            cancellation,
        }
    }
}

#[async_trait]
impl CommandHandler<VerifyFileCommand> for VerifyFileHandler {
    async fn handle(&self, command: VerifyFileCommand) -> Result<IntegrityReport, EngineError> {
        let ctx = context(&command.correlation_id, &self.cancellation);
        let file_id = FileId::parse(command.file_id.clone())?;
        self.file_service
            .verify_file_integrity(&file_id, command.deep, &ctx)
            .await
    }
}

/// Handles `ListFiles`.
pub struct ListFilesHandler {
    file_service: Arc<FileService>,
    cancellation: CancellationFlag,
}

impl ListFilesHandler {
    pub fn new(file_service: Arc<FileService>, cancellation: CancellationFlag) -> Self {
        ListFilesHandler {
            file_service,
            cancellation,
        }
    }
}

#[async_trait]
impl CommandHandler<ListFilesCommand> for ListFilesHandler {
    async fn handle(&self, command: ListFilesCommand) -> Result<Vec<FileDescriptor>, EngineError> {
        let ctx = context(&command.correlation_id, &self.cancellation);
        self.file_service.list_files(&ctx).await
    }
}

/// Handles `ScanDirectory`.
pub struct ScanDirectoryHandler {
    scanner: Arc<DirectoryScanner>,
    reporter: Arc<dyn ProgressReporter>,
    cancellation: CancellationFlag,
}

impl ScanDirectoryHandler {
    pub fn new(scanner: Arc<DirectoryScanner>, cancellation: CancellationFlag) -> Self {
        ScanDirectoryHandler {
            scanner,
            reporter: Arc::new(LogProgressReporter),
            cancellation,
        }
    }
}

#[async_trait]
impl CommandHandler<ScanDirectoryCommand> for ScanDirectoryHandler {
    async fn handle(&self, command: ScanDirectoryCommand) -> Result<ScanProgress, EngineError> {
        let ctx = context(&command.correlation_id, &self.cancellation);
        let options = ScanOptions {
            recursive: command.recursive,
            process_content: command.process_content,
            parallel: command.parallel,
        };
        self.scanner
            .scan(&command.path, options, Some(self.reporter.clone()), &ctx)
            .await
    }
}

fn standard_middleware<C: crate::application::commands::Command>() -> Vec<Arc<dyn CommandMiddleware<C>>> {
    vec![
        Arc::new(ValidationMiddleware),
        Arc::new(LoggingMiddleware),
        Arc::new(PerformanceMiddleware::new()),
    ]
}

/// The engine's command surface: one composed pipeline per command type,
/// built once at startup with the standard middleware set.
pub struct EngineDispatcher {
    upload: CommandPipeline<UploadFileCommand>,
    download: CommandPipeline<DownloadFileCommand>,
    delete: CommandPipeline<DeleteFileCommand>,
    verify: CommandPipeline<VerifyFileCommand>,
    list: CommandPipeline<ListFilesCommand>,
    scan: CommandPipeline<ScanDirectoryCommand>,
}

impl EngineDispatcher {
    pub fn new(file_service: Arc<FileService>, scanner: Arc<DirectoryScanner>, cancellation: CancellationFlag) -> Self {
        EngineDispatcher {
            upload: CommandPipeline::new(
                Arc::new(UploadFileHandler::new(file_service.clone(), cancellation.clone())),
                standard_middleware(),
            ),
            download: CommandPipeline::new(
                Arc::new(DownloadFileHandler::new(file_service.clone(), cancellation.clone())),
                standard_middleware(),
            ),
            delete: CommandPipeline::new(
                Arc::new(DeleteFileHandler::new(file_service.clone(), cancellation.clone())),
                standard_middleware(),
            ),
            verify: CommandPipeline::new(
                Arc::new(VerifyFileHandler::new(file_service.clone(), cancellation.clone())),
                standard_middleware(),
            ),
            list: CommandPipeline::new(
                Arc::new(ListFilesHandler::new(file_service, cancellation.clone())),
                standard_middleware(),
            ),
            scan: CommandPipeline::new(
                Arc::new(ScanDirectoryHandler::new(scanner, cancellation)),
                standard_middleware(),
            ),
        }
    }

    pub async fn upload(&self, command: UploadFileCommand) -> Result<FileDescriptor, EngineError> {
        self.upload.dispatch(command).await
    }

    pub async fn download(&self, command: DownloadFileCommand) -> Result<bool, EngineError> {
        self.download.dispatch(command).await
    }

    pub async fn delete(&self, command: DeleteFileCommand) -> Result<bool, EngineError> {
        self.delete.dispatch(command).await
    }

    pub async fn verify(&self, command: VerifyFileCommand) -> Result<IntegrityReport, EngineError> {
        self.verify.dispatch(command).await
    }

    pub async fn list(&self, command: ListFilesCommand) -> Result<Vec<FileDescriptor>, EngineError> {
        self.list.dispatch(command).await
    }

    pub async fn scan(&self, command: ScanDirectoryCommand) -> Result<ScanProgress, EngineError> {
        self.scan.dispatch(command).await
    }
}
