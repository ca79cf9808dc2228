// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Document-Store Schema
//!
//! Table layout for the metadata document store. Descriptors are stored as
//! JSON documents in a `data` column; the handful of mirrored columns exist
//! only to serve the indexed queries (path lookup, parent listing, chunk
//! manifests). Tags live in a join table so the ALL-tags query stays in SQL.
//!
//! `ensure_schema` is idempotent and runs during startup wiring, before any
//! repository or blob provider touches the pool.

use chunkvault_domain::EngineError;
use sqlx::SqlitePool;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS file_descriptors (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        full_path TEXT NOT NULL,
        parent_id TEXT,
        kind TEXT NOT NULL,
        is_indexed INTEGER NOT NULL DEFAULT 0,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_file_descriptors_full_path ON file_descriptors (full_path)",
    "CREATE INDEX IF NOT EXISTS idx_file_descriptors_parent_id ON file_descriptors (parent_id)",
    "CREATE TABLE IF NOT EXISTS file_tags (
        file_id TEXT NOT NULL,
        tag TEXT NOT NULL,
        PRIMARY KEY (file_id, tag)
    )",
    "CREATE TABLE IF NOT EXISTS chunk_descriptors (
        id TEXT PRIMARY KEY,
        file_id TEXT NOT NULL,
        sequence_number INTEGER NOT NULL,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_chunk_descriptors_file_id ON chunk_descriptors (file_id, sequence_number)",
    "CREATE TABLE IF NOT EXISTS chunk_blobs (
        key TEXT PRIMARY KEY,
        data BLOB NOT NULL,
        created_at TEXT NOT NULL
    )",
];

/// Creates every table and index the engine needs. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), EngineError> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| EngineError::database(format!("schema bootstrap failed: {}", e)))?;
    }
    Ok(())
}
