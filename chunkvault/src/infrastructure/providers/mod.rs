// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Providers & Registry
//!
//! Concrete [`StorageProvider`] backends plus the registry that resolves a
//! provider by the `storage_provider_id` recorded on each chunk descriptor.
//!
//! The registry is populated once during startup wiring and read-only
//! afterwards; reads resolve by ID, writes go through the distribution
//! strategy over [`ProviderRegistry::all`].

pub mod document_blob;
pub mod filesystem;
pub mod object_store;

pub use document_blob::DocumentBlobProvider;
pub use filesystem::FilesystemProvider;
pub use object_store::ObjectStoreProvider;

use chunkvault_domain::{EngineError, StorageProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps provider IDs to live provider instances.
#[derive(Default)]
pub struct ProviderRegistry {
    by_id: HashMap<String, Arc<dyn StorageProvider>>,
    ordered: Vec<Arc<dyn StorageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider. Startup-time only; duplicate IDs are a
    /// configuration error.
    pub fn register(&mut self, provider: Arc<dyn StorageProvider>) -> Result<(), EngineError> {
        let id = provider.provider_id().to_string();
        if self.by_id.contains_key(&id) {
            return Err(EngineError::config(format!("duplicate storage provider id '{}'", id)));
        }
        self.by_id.insert(id, Arc::clone(&provider));
        self.ordered.push(provider);
        Ok(())
    }

    /// Resolves the provider recorded on a chunk descriptor.
    ///
    /// # Errors
    /// [`EngineError::Storage`] naming the unknown ID — a completed chunk
    /// whose placement cannot be resolved is unreadable.
    pub fn resolve(&self, provider_id: &str) -> Result<Arc<dyn StorageProvider>, EngineError> {
        self.by_id.get(provider_id).cloned().ok_or_else(|| {
            EngineError::storage(provider_id, "provider is not registered; chunk placement is unresolvable")
        })
    }

    /// Registration-ordered provider list handed to distribution strategies
    pub fn all(&self) -> &[Arc<dyn StorageProvider>] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
