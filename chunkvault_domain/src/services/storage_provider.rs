// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Provider Port
//!
//! Uniform contract over heterogeneous chunk-blob backends: local
//! filesystem, the document store's blob facility, and object stores. A
//! provider persists, retrieves, checks, and deletes opaque blobs keyed by
//! `(key, storage_path)`.
//!
//! ## Contract
//!
//! - Writes are atomic per chunk: after `write_chunk` returns, the blob is
//!   either fully retrievable under the returned `storage_path` or does not
//!   exist at all
//! - Reads return the exact bytes written
//! - `delete_chunk` is idempotent: deleting a missing blob is `Ok(true)`
//! - Providers are stateless across chunks; one instance serves many
//!   concurrent operations
//! - Providers never retry; any I/O failure surfaces as
//!   [`EngineError::Storage`] carrying the provider ID and cause, and the
//!   caller decides retry/abort

use crate::error::EngineError;
use crate::value_objects::{ChunkKey, OperationContext};
use async_trait::async_trait;

/// Backend capable of storing opaque chunk blobs.
///
/// `provider_id` is the stable identifier recorded in chunk descriptors and
/// resolved through the registry at read time; `kind` is a human-readable
/// backend family name for logs and reports.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Stable identifier recorded in chunk placements
    fn provider_id(&self) -> &str;

    /// Human-readable backend family ("filesystem", "document-blob", ...)
    fn kind(&self) -> &str;

    /// Persists a blob; returns the opaque locator needed to read it back
    async fn write_chunk(&self, key: &ChunkKey, data: &[u8], ctx: &OperationContext) -> Result<String, EngineError>;

    /// Retrieves the exact bytes previously written under `storage_path`
    async fn read_chunk(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<Vec<u8>, EngineError>;

    /// Checks whether the blob is retrievable
    async fn chunk_exists(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<bool, EngineError>;

    /// Removes the blob; `Ok(true)` whether or not it existed
    async fn delete_chunk(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<bool, EngineError>;
}
