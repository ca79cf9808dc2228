// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Metadata Repository Port
//!
//! Persistence contract for [`FileDescriptor`] documents. The domain stays
//! independent of the storage technology; the infrastructure layer supplies
//! a document-store implementation and a write-through cached decorator with
//! the same contract.
//!
//! ## Guarantees
//!
//! - `add` + `get_by_id` round-trips an equal descriptor
//! - `update` is a full replacement keyed by `id`; `Ok(true)` iff a document
//!   was matched
//! - `delete` returns `Ok(true)` iff a document was removed
//! - every method accepts the operation context (correlation ID +
//!   cancellation signal)

use crate::entities::{DescriptorKind, FileDescriptor};
use crate::error::EngineError;
use crate::value_objects::{FileId, OperationContext};
use async_trait::async_trait;

/// Repository port for file descriptors.
///
/// Implementations must be thread-safe (`Send + Sync`); each method is
/// atomic per document, cross-document consistency belongs to the caller.
#[async_trait]
pub trait FileMetadataRepository: Send + Sync {
    /// Persists a new descriptor
    async fn add(&self, descriptor: &FileDescriptor, ctx: &OperationContext) -> Result<(), EngineError>;

    /// Fetches a descriptor by ID
    async fn get_by_id(&self, id: &FileId, ctx: &OperationContext) -> Result<Option<FileDescriptor>, EngineError>;

    /// Replaces the stored document; true iff a document was matched
    async fn update(&self, descriptor: &FileDescriptor, ctx: &OperationContext) -> Result<bool, EngineError>;

    /// Removes a descriptor; true iff a document was removed
    async fn delete(&self, id: &FileId, ctx: &OperationContext) -> Result<bool, EngineError>;

    /// Lists every descriptor
    async fn get_all(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError>;

    /// Fetches the descriptor registered at an exact path
    async fn get_by_full_path(
        &self,
        full_path: &str,
        ctx: &OperationContext,
    ) -> Result<Option<FileDescriptor>, EngineError>;

    /// Lists the direct children of a directory
    async fn get_children(&self, parent_id: &FileId, ctx: &OperationContext)
        -> Result<Vec<FileDescriptor>, EngineError>;

    /// Lists descriptors whose path starts with `prefix`
    async fn get_by_parent_path(&self, prefix: &str, ctx: &OperationContext)
        -> Result<Vec<FileDescriptor>, EngineError>;

    /// Lists descriptors of one kind (files or directories)
    async fn get_by_kind(&self, kind: DescriptorKind, ctx: &OperationContext)
        -> Result<Vec<FileDescriptor>, EngineError>;

    /// Lists files that have not been indexed yet
    async fn get_non_indexed(&self, ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError>;

    /// Lists files carrying ALL of the requested tags
    async fn get_by_tags(&self, tags: &[String], ctx: &OperationContext) -> Result<Vec<FileDescriptor>, EngineError>;
}
