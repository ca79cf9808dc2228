// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Metadata Repository Port
//!
//! Persistence contract for [`ChunkDescriptor`] documents. Same guarantees
//! as the file repository; the chunk-specific queries serve the reassembly
//! path, which relies on `get_chunks_by_file_id` returning the manifest
//! sorted by sequence number.

use crate::entities::ChunkDescriptor;
use crate::error::EngineError;
use crate::value_objects::{FileId, OperationContext};
use async_trait::async_trait;

/// Repository port for chunk descriptors.
#[async_trait]
pub trait ChunkMetadataRepository: Send + Sync {
    /// Persists a new descriptor
    async fn add(&self, descriptor: &ChunkDescriptor, ctx: &OperationContext) -> Result<(), EngineError>;

    /// Fetches a descriptor by its `"{file_id}_{sequence}"` ID
    async fn get_by_id(&self, id: &str, ctx: &OperationContext) -> Result<Option<ChunkDescriptor>, EngineError>;

    /// Replaces the stored document; true iff a document was matched
    async fn update(&self, descriptor: &ChunkDescriptor, ctx: &OperationContext) -> Result<bool, EngineError>;

    /// Removes a descriptor; true iff a document was removed
    async fn delete(&self, id: &str, ctx: &OperationContext) -> Result<bool, EngineError>;

    /// Lists every descriptor
    async fn get_all(&self, ctx: &OperationContext) -> Result<Vec<ChunkDescriptor>, EngineError>;

    /// Lists a file's chunks sorted by ascending sequence number
    async fn get_chunks_by_file_id(
        &self,
        file_id: &FileId,
        ctx: &OperationContext,
    ) -> Result<Vec<ChunkDescriptor>, EngineError>;

    /// Removes every chunk descriptor of a file; returns the removed count
    async fn delete_chunks_by_file_id(&self, file_id: &FileId, ctx: &OperationContext) -> Result<u64, EngineError>;
}
