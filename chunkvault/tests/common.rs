// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared helpers for the integration tests: a fully wired engine rooted in
//! a scratch directory, plus deterministic test payloads.

use chunkvault::infrastructure::config::{CacheSettings, ChunkingSettings, ConnectionSettings, EngineSettings, StorageSettings};
use chunkvault::startup::{build_engine, Engine};
use chunkvault_domain::CancellationFlag;
use tempfile::TempDir;

/// An engine wired against temp-dir storage. Keep the `TempDir` alive for
/// the duration of the test.
pub struct TestEngine {
    pub engine: Engine,
    pub cancellation: CancellationFlag,
    pub settings: EngineSettings,
    #[allow(dead_code)]
    pub scratch: TempDir,
}

/// Default test chunking: 64 KiB min, 256 KiB default, 1 MiB max.
pub fn test_settings(scratch: &TempDir) -> EngineSettings {
    EngineSettings {
        connection: ConnectionSettings {
            database_path: scratch.path().join("vault.db").display().to_string(),
            redis_url: None,
        },
        chunking: ChunkingSettings {
            default_chunk_size_bytes: 256 * 1024,
            min_chunk_size_bytes: 64 * 1024,
            max_chunk_size_bytes: 1024 * 1024,
            compression_enabled: true,
            compression_level: 6,
            rollback_on_failure: true,
        },
        storage: StorageSettings {
            filesystem_root: scratch.path().join("chunks").display().to_string(),
            object_store_root: scratch.path().join("objects").display().to_string(),
            distribution_strategy: "round-robin".into(),
            io_timeout_secs: 30,
        },
        cache: CacheSettings {
            enabled: true,
            ttl_secs: 60,
        },
    }
}

pub async fn engine() -> TestEngine {
    let scratch = TempDir::new().expect("scratch dir");
    let settings = test_settings(&scratch);
    engine_with(scratch, settings).await
}

pub async fn engine_with(scratch: TempDir, settings: EngineSettings) -> TestEngine {
    let cancellation = CancellationFlag::new();
    let engine = build_engine(&settings, cancellation.clone())
        .await
        .expect("engine wiring");
    TestEngine {
        engine,
        cancellation,
        settings,
        scratch,
    }
}

/// Deterministic, compressible-but-not-trivial payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let i = i as u64;
            (i.wrapping_mul(31).wrapping_add(i / 251) % 251) as u8
        })
        .collect()
}
