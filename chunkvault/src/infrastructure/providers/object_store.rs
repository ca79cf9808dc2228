// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Object-Store Provider
//!
//! Stores one object per chunk under a configured prefix through the
//! `object_store` crate. The default wiring uses the local-filesystem
//! backend; S3-compatible stores plug in through the same
//! `Arc<dyn ObjectStore>` seam without touching this file.
//!
//! `storage_path` is the object path relative to the store root. Object
//! stores give per-object atomic puts, which satisfies the per-chunk write
//! atomicity contract directly.

use async_trait::async_trait;
use chunkvault_domain::{ChunkKey, EngineError, OperationContext, StorageProvider};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::debug;

/// Chunk-blob backend over an object store bucket/prefix.
pub struct ObjectStoreProvider {
    provider_id: String,
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ObjectStoreProvider {
    pub fn new(provider_id: impl Into<String>, store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        ObjectStoreProvider {
            provider_id: provider_id.into(),
            store,
            prefix: prefix.into(),
        }
    }

    fn object_path_for(&self, key: &ChunkKey) -> String {
        if self.prefix.is_empty() {
            key.as_str().to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), key)
        }
    }

    fn store_error(&self, action: &str, err: object_store::Error) -> EngineError {
        EngineError::storage(&self.provider_id, format!("object {} failed: {}", action, err))
    }
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn kind(&self) -> &str {
        "object-store"
    }

    async fn write_chunk(&self, key: &ChunkKey, data: &[u8], ctx: &OperationContext) -> Result<String, EngineError> {
        let storage_path = self.object_path_for(key);
        let location = ObjectPath::from(storage_path.as_str());
        self.store
            .put(&location, PutPayload::from(data.to_vec()))
            .await
            .map_err(|e| self.store_error("put", e))?;

        debug!(
            correlation_id = %ctx.correlation_id(),
            provider = %self.provider_id,
            key = %key,
            bytes = data.len(),
            "chunk written"
        );
        Ok(storage_path)
    }

    async fn read_chunk(
        &self,
        _key: &ChunkKey,
        storage_path: &str,
        _ctx: &OperationContext,
    ) -> Result<Vec<u8>, EngineError> {
        let location = ObjectPath::from(storage_path);
        let result = self.store.get(&location).await.map_err(|e| self.store_error("get", e))?;
        let bytes = result.bytes().await.map_err(|e| self.store_error("get", e))?;
        Ok(bytes.to_vec())
    }

    async fn chunk_exists(
        &self,
        _key: &ChunkKey,
        storage_path: &str,
        _ctx: &OperationContext,
    ) -> Result<bool, EngineError> {
        let location = ObjectPath::from(storage_path);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(self.store_error("head", err)),
        }
    }

    async fn delete_chunk(
        &self,
        key: &ChunkKey,
        storage_path: &str,
        ctx: &OperationContext,
    ) -> Result<bool, EngineError> {
        let location = ObjectPath::from(storage_path);
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(
                    correlation_id = %ctx.correlation_id(),
                    provider = %self.provider_id,
                    key = %key,
                    "chunk deleted"
                );
                Ok(true)
            }
            Err(err) => Err(self.store_error("delete", err)),
        }
    }
}
