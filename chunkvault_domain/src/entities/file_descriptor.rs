// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Descriptor Entity
//!
//! Metadata record for one stored file or discovered directory. The file
//! service owns every status transition; repositories only persist what they
//! are handed.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──► Processing ──► Completed
//!                 │
//!                 ├──► Failed   (fatal error or cancellation mid-upload)
//!                 └──► Error    (terminal, set by lifecycle evaluation)
//! ```
//!
//! A `Completed` file is backed by exactly `chunk_count` stored chunks whose
//! concatenated plaintext hashes to `checksum`. `chunk_count` is written once
//! at upload finalize, never incremented as chunks land.

use crate::value_objects::{CorrelationId, FileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether a descriptor names a regular file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorKind {
    File,
    Directory,
}

impl DescriptorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::File => "file",
            DescriptorKind::Directory => "directory",
        }
    }
}

/// File lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Failed,
}

impl FileStatus {
    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error | FileStatus::Failed)
    }
}

/// Metadata record for a file or directory known to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: FileId,
    pub name: String,
    pub full_path: String,
    pub extension: String,
    pub content_type: String,
    /// Plaintext size in bytes; `None` for directories
    pub size: Option<u64>,
    pub kind: DescriptorKind,
    pub parent_id: Option<FileId>,
    /// SHA-256 of the full plaintext content, hex-encoded; files only
    pub checksum: Option<String>,
    pub status: FileStatus,
    pub chunk_count: u32,
    pub tags: Vec<String>,
    pub is_indexed: bool,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub correlation_id: CorrelationId,
}

impl FileDescriptor {
    /// Creates a pending descriptor for a regular file about to be uploaded
    pub fn new_file(name: impl Into<String>, full_path: impl Into<String>, correlation_id: CorrelationId) -> Self {
        let name = name.into();
        let full_path = full_path.into();
        let extension = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content_type = content_type_for_extension(&extension);
        let now = Utc::now();
        FileDescriptor {
            id: FileId::generate(),
            name,
            full_path,
            extension,
            content_type,
            size: None,
            kind: DescriptorKind::File,
            parent_id: None,
            checksum: None,
            status: FileStatus::Pending,
            chunk_count: 0,
            tags: Vec::new(),
            is_indexed: false,
            last_indexed_at: None,
            created_at: now,
            modified_at: now,
            updated_at: now,
            correlation_id,
        }
    }

    /// Creates a descriptor for a discovered directory
    pub fn new_directory(
        name: impl Into<String>,
        full_path: impl Into<String>,
        parent_id: Option<FileId>,
        correlation_id: CorrelationId,
    ) -> Self {
        let now = Utc::now();
        FileDescriptor {
            id: FileId::generate(),
            name: name.into(),
            full_path: full_path.into(),
            extension: String::new(),
            content_type: String::new(),
            size: None,
            kind: DescriptorKind::Directory,
            parent_id,
            checksum: None,
            status: FileStatus::Completed,
            chunk_count: 0,
            tags: Vec::new(),
            is_indexed: false,
            last_indexed_at: None,
            created_at: now,
            modified_at: now,
            updated_at: now,
            correlation_id,
        }
    }

    pub fn with_parent(mut self, parent_id: FileId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the first chunk write: Pending -> Processing
    pub fn begin_processing(&mut self) {
        if self.status == FileStatus::Pending {
            self.status = FileStatus::Processing;
            self.touch();
        }
    }

    /// Finalizes a successful upload in one step.
    ///
    /// Writes the whole-file checksum, the authoritative chunk count, and the
    /// byte size. The status stays `Processing` until the completion
    /// evaluation confirms every chunk is durable.
    pub fn finalize_upload(&mut self, checksum: String, size: u64, chunk_count: u32) {
        self.checksum = Some(checksum);
        self.size = Some(size);
        self.chunk_count = chunk_count;
        self.touch();
    }

    /// Marks the file complete once all chunks are observed `Stored`
    pub fn mark_completed(&mut self) {
        self.status = FileStatus::Completed;
        self.touch();
    }

    /// Marks the file failed. Terminal.
    pub fn mark_failed(&mut self) {
        self.status = FileStatus::Failed;
        self.touch();
    }

    /// Adds a tag, preserving set semantics
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.iter().any(|existing| existing == &tag) {
            self.tags.push(tag);
            self.touch();
        }
    }

    /// Checks whether the descriptor carries every requested tag
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|wanted| self.tags.iter().any(|t| t == wanted))
    }

    /// Records a completed indexing pass
    pub fn mark_indexed(&mut self) {
        self.is_indexed = true;
        self.last_indexed_at = Some(Utc::now());
        self.touch();
    }

    pub fn is_directory(&self) -> bool {
        self.kind == DescriptorKind::Directory
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.modified_at = self.updated_at;
    }
}

/// Best-effort MIME mapping for the extensions the scanner commonly meets.
fn content_type_for_extension(extension: &str) -> String {
    match extension {
        "txt" | "log" | "md" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_defaults() {
        let file = FileDescriptor::new_file("report.json", "/data/report.json", CorrelationId::generate());
        assert_eq!(file.status, FileStatus::Pending);
        assert_eq!(file.kind, DescriptorKind::File);
        assert_eq!(file.extension, "json");
        assert_eq!(file.content_type, "application/json");
        assert_eq!(file.chunk_count, 0);
        assert!(file.checksum.is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut file = FileDescriptor::new_file("a.bin", "/a.bin", CorrelationId::generate());
        file.begin_processing();
        assert_eq!(file.status, FileStatus::Processing);
        file.finalize_upload("deadbeef".into(), 42, 3);
        assert_eq!(file.status, FileStatus::Processing);
        assert_eq!(file.chunk_count, 3);
        file.mark_completed();
        assert!(file.status.is_terminal());
    }

    #[test]
    fn test_tags_are_a_set() {
        let mut file = FileDescriptor::new_file("a", "/a", CorrelationId::generate());
        file.add_tag("archive");
        file.add_tag("archive");
        file.add_tag("2024");
        assert_eq!(file.tags.len(), 2);
        assert!(file.has_all_tags(&["archive".into(), "2024".into()]));
        assert!(!file.has_all_tags(&["archive".into(), "missing".into()]));
    }

    #[test]
    fn test_directory_has_no_size_or_checksum() {
        let dir = FileDescriptor::new_directory("docs", "/docs", None, CorrelationId::generate());
        assert!(dir.is_directory());
        assert!(dir.size.is_none());
        assert!(dir.checksum.is_none());
        assert_eq!(dir.status, FileStatus::Completed);
    }
}
