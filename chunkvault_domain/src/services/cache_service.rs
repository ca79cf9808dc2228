// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Service Port
//!
//! Key-value cache contract fronting the metadata repositories. Values are
//! JSON-serialized descriptors; keys are descriptor IDs (or query keys where
//! a repository offers a query form).
//!
//! The cache is advisory. A `get` miss sends the caller to the repository,
//! which repopulates on success; a cache failure is an
//! [`EngineError::Cache`], which callers log and ignore. Writes reach the
//! repository first and the cache second; deletes invalidate the cache
//! before the repository delete is acknowledged.

use crate::error::EngineError;
use crate::value_objects::OperationContext;
use async_trait::async_trait;
use std::time::Duration;

/// Write-through cache over JSON string payloads.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Fetches the cached payload, `None` on miss
    async fn get(&self, key: &str, ctx: &OperationContext) -> Result<Option<String>, EngineError>;

    /// Stores a payload with a time-to-live
    async fn set(&self, key: &str, value: &str, ttl: Duration, ctx: &OperationContext) -> Result<(), EngineError>;

    /// Invalidates a key; missing keys are not an error
    async fn delete(&self, key: &str, ctx: &OperationContext) -> Result<(), EngineError>;

    /// Checks for a live entry
    async fn exists(&self, key: &str, ctx: &OperationContext) -> Result<bool, EngineError>;
}
