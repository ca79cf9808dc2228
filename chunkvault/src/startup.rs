// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Composition Root
//!
//! Explicit startup wiring: every provider, repository, cache, event
//! handler, and middleware chain is constructed here and handed to the
//! registry, bus, and dispatcher as a typed registration. There is no
//! runtime discovery — the provider set and handler set are enumerated
//! below, in code.
//!
//! The same wiring serves the CLI binary and the integration tests; tests
//! pass temp-dir settings and a fresh cancellation flag.

use crate::application::handlers::EngineDispatcher;
use crate::application::services::chunk_lifecycle::{
    ChunkLifecycleHandler, ChunkLifecycleService, ChunkStoredLogHandler,
};
use crate::application::services::chunk_manager::{default_worker_bound, ChunkManager, ChunkManagerConfig};
use crate::application::services::directory_scanner::DirectoryScanner;
use crate::application::services::file_service::FileService;
use crate::infrastructure::cache::{
    CachedChunkMetadataRepository, CachedFileMetadataRepository, MemoryCacheService, RedisCacheService,
};
use crate::infrastructure::compression::GzipCompressionService;
use crate::infrastructure::config::EngineSettings;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::providers::{
    DocumentBlobProvider, FilesystemProvider, ObjectStoreProvider, ProviderRegistry,
};
use crate::infrastructure::repositories::{connect_database, SqliteChunkRepository, SqliteFileRepository};
use chunkvault_domain::{
    CacheService, CancellationFlag, ChunkMetadataRepository, DistributionStrategy, EngineError,
    FileMetadataRepository, RoundRobinStrategy,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fully wired engine.
pub struct Engine {
    pub dispatcher: Arc<EngineDispatcher>,
    pub file_repository: Arc<dyn FileMetadataRepository>,
    pub chunk_repository: Arc<dyn ChunkMetadataRepository>,
    pub provider_registry: Arc<ProviderRegistry>,
    pub event_bus: Arc<EventBus>,
}

/// Builds the engine from settings. Fails fast on any misconfiguration.
pub async fn build_engine(settings: &EngineSettings, cancellation: CancellationFlag) -> Result<Engine, EngineError> {
    settings.validate()?;

    // Document store
    let pool = connect_database(Path::new(&settings.connection.database_path)).await?;

    // Metadata repositories, optionally fronted by the write-through cache
    let raw_file_repository: Arc<dyn FileMetadataRepository> = Arc::new(SqliteFileRepository::new(pool.clone()));
    let raw_chunk_repository: Arc<dyn ChunkMetadataRepository> = Arc::new(SqliteChunkRepository::new(pool.clone()));
    let (file_repository, chunk_repository) = if settings.cache.enabled {
        let cache = build_cache(settings).await;
        let ttl = settings.cache.ttl();
        (
            Arc::new(CachedFileMetadataRepository::new(raw_file_repository, cache.clone(), ttl))
                as Arc<dyn FileMetadataRepository>,
            Arc::new(CachedChunkMetadataRepository::new(raw_chunk_repository, cache, ttl))
                as Arc<dyn ChunkMetadataRepository>,
        )
    } else {
        (raw_file_repository, raw_chunk_repository)
    };

    // Storage providers, enumerated explicitly
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(FilesystemProvider::new(
        "filesystem",
        &settings.storage.filesystem_root,
    )))?;
    registry.register(Arc::new(DocumentBlobProvider::new("document-blob", pool.clone())))?;
    tokio::fs::create_dir_all(&settings.storage.object_store_root)
        .await
        .map_err(|e| {
            EngineError::config(format!(
                "cannot create object store root '{}': {}",
                settings.storage.object_store_root, e
            ))
        })?;
    let local_store = object_store::local::LocalFileSystem::new_with_prefix(&settings.storage.object_store_root)
        .map_err(|e| {
            EngineError::config(format!(
                "object store root '{}' is unusable: {}",
                settings.storage.object_store_root, e
            ))
        })?;
    registry.register(Arc::new(ObjectStoreProvider::new(
        "object-store",
        Arc::new(local_store),
        "chunks",
    )))?;
    let registry = Arc::new(registry);

    let strategy = build_strategy(&settings.storage.distribution_strategy)?;

    // Event bus with the handler set enumerated at startup
    let event_bus = Arc::new(EventBus::new());
    let lifecycle = Arc::new(ChunkLifecycleService::new(
        file_repository.clone(),
        chunk_repository.clone(),
        event_bus.clone(),
    ));
    event_bus.subscribe(
        chunkvault_domain::EventKind::ChunkStored,
        Arc::new(ChunkStoredLogHandler),
    );
    event_bus.subscribe(
        chunkvault_domain::EventKind::ChunkStored,
        Arc::new(ChunkLifecycleHandler::new(lifecycle.clone())),
    );

    // Chunk pipeline
    let chunk_manager = Arc::new(ChunkManager::new(
        ChunkManagerConfig {
            size_policy: settings.chunking.size_policy()?,
            compression_enabled: settings.chunking.compression_enabled,
            compression_level: settings.chunking.level()?,
            rollback_on_failure: settings.chunking.rollback_on_failure,
            io_timeout: settings.storage.io_timeout(),
            worker_bound: default_worker_bound(),
        },
        registry.clone(),
        strategy,
        Arc::new(GzipCompressionService::new()),
        chunk_repository.clone(),
        event_bus.clone(),
    ));

    let file_service = Arc::new(FileService::new(
        file_repository.clone(),
        chunk_manager,
        lifecycle,
    ));
    let scanner = Arc::new(DirectoryScanner::new(
        file_repository.clone(),
        file_service.clone(),
        event_bus.clone(),
        default_worker_bound(),
        Duration::from_secs(2),
    ));

    let dispatcher = Arc::new(EngineDispatcher::new(file_service, scanner, cancellation));
    info!(
        database = %settings.connection.database_path,
        providers = 3,
        strategy = %settings.storage.distribution_strategy,
        "engine wired"
    );
    Ok(Engine {
        dispatcher,
        file_repository,
        chunk_repository,
        provider_registry: registry,
        event_bus,
    })
}

async fn build_cache(settings: &EngineSettings) -> Arc<dyn CacheService> {
    if let Some(url) = &settings.connection.redis_url {
        match RedisCacheService::connect(url, "chunkvault").await {
            Ok(cache) => {
                info!(url = %url, "redis cache connected");
                return Arc::new(cache);
            }
            Err(err) => {
                // The cache is advisory; a dead Redis never blocks startup.
                warn!(url = %url, error = %err, "redis unavailable, using in-process cache");
            }
        }
    }
    Arc::new(MemoryCacheService::new())
}

fn build_strategy(name: &str) -> Result<Arc<dyn DistributionStrategy>, EngineError> {
    match name {
        "round-robin" => Ok(Arc::new(RoundRobinStrategy::new())),
        other => Err(EngineError::config(format!(
            "unknown distribution strategy '{}' (supported: round-robin)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(build_strategy("round-robin").is_ok());
        assert!(build_strategy("weighted").is_err());
    }
}
