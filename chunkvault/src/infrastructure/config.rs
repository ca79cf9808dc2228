// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Configuration
//!
//! Typed settings for the whole engine, loaded from an optional TOML file
//! layered under `CHUNKVAULT_`-prefixed environment overrides
//! (`CHUNKVAULT_CHUNKING__COMPRESSION_LEVEL=9` and friends). Every field has
//! a default so a bare binary runs against local paths with no config file
//! at all.
//!
//! ```toml
//! [connection]
//! database_path = "chunkvault.db"
//! redis_url = "redis://127.0.0.1:6379"
//!
//! [chunking]
//! default_chunk_size_bytes = 1048576
//! min_chunk_size_bytes = 65536
//! max_chunk_size_bytes = 10485760
//! compression_enabled = true
//! compression_level = 6
//! rollback_on_failure = true
//!
//! [storage]
//! filesystem_root = "./vault/chunks"
//! object_store_root = "./vault/objects"
//! distribution_strategy = "round-robin"
//! io_timeout_secs = 30
//!
//! [cache]
//! enabled = true
//! ttl_secs = 300
//! ```

use chunkvault_domain::services::compression_service::CompressionLevel;
use chunkvault_domain::{ChunkSizePolicy, EngineError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Backing-store connection strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Document-store database file
    pub database_path: String,
    /// Redis URL; absent means the in-process cache is used
    pub redis_url: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            database_path: "chunkvault.db".into(),
            redis_url: None,
        }
    }
}

/// Chunk pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub default_chunk_size_bytes: u64,
    pub min_chunk_size_bytes: u64,
    pub max_chunk_size_bytes: u64,
    pub compression_enabled: bool,
    /// gzip level, 0-9
    pub compression_level: u32,
    /// Best-effort rollback of already-stored chunks on upload failure
    pub rollback_on_failure: bool,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        ChunkingSettings {
            default_chunk_size_bytes: 1024 * 1024,
            min_chunk_size_bytes: 64 * 1024,
            max_chunk_size_bytes: 10 * 1024 * 1024,
            compression_enabled: true,
            compression_level: 6,
            rollback_on_failure: true,
        }
    }
}

impl ChunkingSettings {
    pub fn size_policy(&self) -> Result<ChunkSizePolicy, EngineError> {
        ChunkSizePolicy::new(
            self.min_chunk_size_bytes,
            self.default_chunk_size_bytes,
            self.max_chunk_size_bytes,
        )
    }

    pub fn level(&self) -> Result<CompressionLevel, EngineError> {
        CompressionLevel::new(self.compression_level)
    }
}

/// Storage provider roots and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub filesystem_root: String,
    pub object_store_root: String,
    /// Write-time placement policy; "round-robin" is the baseline
    pub distribution_strategy: String,
    /// Per-provider I/O deadline
    pub io_timeout_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            filesystem_root: "./vault/chunks".into(),
            object_store_root: "./vault/objects".into(),
            distribution_strategy: "round-robin".into(),
            io_timeout_secs: 30,
        }
    }
}

impl StorageSettings {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

/// Metadata cache knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            ttl_secs: 300,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Root settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub connection: ConnectionSettings,
    pub chunking: ChunkingSettings,
    pub storage: StorageSettings,
    pub cache: CacheSettings,
}

impl EngineSettings {
    /// Loads settings from an optional TOML file plus environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self, EngineError> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder.add_source(config::File::with_name("chunkvault").required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("CHUNKVAULT").separator("__"));

        let settings = builder
            .build()
            .map_err(|e| EngineError::config(format!("configuration load failed: {}", e)))?
            .try_deserialize::<EngineSettings>()
            .map_err(|e| EngineError::config(format!("configuration parse failed: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Cross-field validation beyond what serde can express
    pub fn validate(&self) -> Result<(), EngineError> {
        self.chunking.size_policy()?;
        self.chunking.level()?;
        if self.storage.io_timeout_secs == 0 {
            return Err(EngineError::config("storage.io_timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let settings = EngineSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.chunking.compression_level, 6);
        assert_eq!(settings.storage.io_timeout(), Duration::from_secs(30));
        assert!(settings.connection.redis_url.is_none());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[chunking]\ncompression_level = 9\n\n[cache]\nenabled = false\nttl_secs = 10\n"
        )
        .unwrap();

        let settings = EngineSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.chunking.compression_level, 9);
        assert!(!settings.cache.enabled);
        assert_eq!(settings.cache.ttl(), Duration::from_secs(10));
        // Untouched sections keep defaults
        assert_eq!(settings.chunking.min_chunk_size_bytes, 64 * 1024);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let settings = EngineSettings {
            chunking: ChunkingSettings {
                compression_level: 12,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
