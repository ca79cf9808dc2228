// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Commands
//!
//! Typed commands for every user-visible operation. Each command carries a
//! correlation ID (auto-generated when the caller does not supply one) and
//! its declarative validation rules; the validation middleware runs
//! [`Command::validate`] before any I/O happens.
//!
//! Validation failures are [`EngineError::Validation`] — never retried,
//! surfaced directly to the caller.

use crate::application::services::chunk_manager::IntegrityReport;
use crate::application::services::directory_scanner::ScanProgress;
use chunkvault_domain::{CorrelationId, EngineError, FileDescriptor, FileId};
use std::path::PathBuf;

/// A dispatchable command with declarative validation.
pub trait Command: Send + Sync + Clone + 'static {
    /// Result type the handler produces
    type Output: Send + 'static;

    /// Command name used in logs and the state machine
    fn name(&self) -> &'static str;

    fn correlation_id(&self) -> &CorrelationId;

    /// Declarative input validation; runs before any middleware downstream
    /// of the validation layer
    fn validate(&self) -> Result<(), EngineError>;
}

fn require_file_id(raw: &str, command: &str) -> Result<(), EngineError> {
    if raw.trim().is_empty() {
        return Err(EngineError::validation(format!("{}: file id is required", command)));
    }
    FileId::parse(raw).map(|_| ())
}

/// Upload one file from the local filesystem.
#[derive(Debug, Clone)]
pub struct UploadFileCommand {
    pub source_path: PathBuf,
    /// Logical name recorded on the descriptor; `None` fails validation
    pub file_name: Option<String>,
    pub correlation_id: CorrelationId,
}

impl UploadFileCommand {
    pub fn new(source_path: PathBuf) -> Self {
        let file_name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        UploadFileCommand {
            source_path,
            file_name,
            correlation_id: CorrelationId::generate(),
        }
    }
}

impl Command for UploadFileCommand {
    type Output = FileDescriptor;

    fn name(&self) -> &'static str {
        "UploadFile"
    }

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    fn validate(&self) -> Result<(), EngineError> {
        match &self.file_name {
            None => return Err(EngineError::validation("UploadFile: file name is required")),
            Some(name) if name.trim().is_empty() => {
                return Err(EngineError::validation("UploadFile: file name cannot be blank"))
            }
            Some(_) => {}
        }
        if self.source_path.as_os_str().is_empty() {
            return Err(EngineError::validation("UploadFile: source path is required"));
        }
        Ok(())
    }
}

/// Download (reassemble) a stored file to a local path.
#[derive(Debug, Clone)]
pub struct DownloadFileCommand {
    pub file_id: String,
    pub output_path: PathBuf,
    pub correlation_id: CorrelationId,
}

impl DownloadFileCommand {
    pub fn new(file_id: impl Into<String>, output_path: PathBuf) -> Self {
        DownloadFileCommand {
            file_id: file_id.into(),
            output_path,
            correlation_id: CorrelationId::generate(),
        }
    }
}

impl Command for DownloadFileCommand {
    type Output = bool;

    fn name(&self) -> &'static str {
        "DownloadFile"
    }

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    fn validate(&self) -> Result<(), EngineError> {
        require_file_id(&self.file_id, "DownloadFile")?;
        if self.output_path.as_os_str().is_empty() {
            return Err(EngineError::validation("DownloadFile: output path is required"));
        }
        Ok(())
    }
}

/// Delete a stored file, its chunks, and their blobs.
#[derive(Debug, Clone)]
pub struct DeleteFileCommand {
    pub file_id: String,
    /// Fail instead of succeeding quietly when the file does not exist
    pub strict: bool,
    pub correlation_id: CorrelationId,
}

impl DeleteFileCommand {
    pub fn new(file_id: impl Into<String>) -> Self {
        DeleteFileCommand {
            file_id: file_id.into(),
            strict: false,
            correlation_id: CorrelationId::generate(),
        }
    }
}

impl Command for DeleteFileCommand {
    type Output = bool;

    fn name(&self) -> &'static str {
        "DeleteFile"
    }

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    fn validate(&self) -> Result<(), EngineError> {
        require_file_id(&self.file_id, "DeleteFile")
    }
}

/// Check a stored file's integrity without producing output bytes.
#[derive(Debug, Clone)]
pub struct VerifyFileCommand {
    pub file_id: String,
    /// Deep mode reads and re-hashes every chunk; shallow checks metadata only
    pub deep: bool,
    pub correlation_id: CorrelationId,
}

impl VerifyFileCommand {
    pub fn new(file_id: impl Into<String>, deep: bool) -> Self {
        VerifyFileCommand {
            file_id: file_id.into(),
            deep,
            correlation_id: CorrelationId::generate(),
        }
    }
}

impl Command for VerifyFileCommand {
    type Output = IntegrityReport;

    fn name(&self) -> &'static str {
        "VerifyFile"
    }

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    fn validate(&self) -> Result<(), EngineError> {
        require_file_id(&self.file_id, "VerifyFile")
    }
}

/// List every known file descriptor.
#[derive(Debug, Clone)]
pub struct ListFilesCommand {
    pub correlation_id: CorrelationId,
}

impl ListFilesCommand {
    pub fn new() -> Self {
        ListFilesCommand {
            correlation_id: CorrelationId::generate(),
        }
    }
}

impl Default for ListFilesCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for ListFilesCommand {
    type Output = Vec<FileDescriptor>;

    fn name(&self) -> &'static str {
        "ListFiles"
    }

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    fn validate(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Discover files and directories under a root path.
#[derive(Debug, Clone)]
pub struct ScanDirectoryCommand {
    pub path: PathBuf,
    pub recursive: bool,
    /// Upload each discovered file's content through the chunk pipeline
    pub process_content: bool,
    /// Process file contents on the bounded worker pool
    pub parallel: bool,
    pub correlation_id: CorrelationId,
}

impl ScanDirectoryCommand {
    pub fn new(path: PathBuf, recursive: bool) -> Self {
        ScanDirectoryCommand {
            path,
            recursive,
            process_content: false,
            parallel: false,
            correlation_id: CorrelationId::generate(),
        }
    }
}

impl Command for ScanDirectoryCommand {
    type Output = ScanProgress;

    fn name(&self) -> &'static str {
        "ScanDirectory"
    }

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.path.as_os_str().is_empty() {
            return Err(EngineError::validation("ScanDirectory: path is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_requires_file_name() {
        let mut command = UploadFileCommand::new(PathBuf::from("/tmp/data.bin"));
        assert!(command.validate().is_ok());
        command.file_name = None;
        let err = command.validate().unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_upload_derives_name_from_path() {
        let command = UploadFileCommand::new(PathBuf::from("/tmp/data.bin"));
        assert_eq!(command.file_name.as_deref(), Some("data.bin"));
    }

    #[test]
    fn test_download_requires_parseable_file_id() {
        assert!(DownloadFileCommand::new("", PathBuf::from("out")).validate().is_err());
        assert!(DownloadFileCommand::new("has_underscore", PathBuf::from("out"))
            .validate()
            .is_err());
        assert!(
            DownloadFileCommand::new("01ARZ3NDEKTSV4RRFFQ69G5FAV", PathBuf::from("out"))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_list_always_validates() {
        assert!(ListFilesCommand::new().validate().is_ok());
    }
}
