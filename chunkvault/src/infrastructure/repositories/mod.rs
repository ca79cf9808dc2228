// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite document-store implementations of the metadata repository ports.

pub mod schema;
pub mod sqlite_chunk_repository;
pub mod sqlite_file_repository;

pub use sqlite_chunk_repository::SqliteChunkRepository;
pub use sqlite_file_repository::SqliteFileRepository;

use chunkvault_domain::EngineError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Opens (creating if necessary) the document-store database file and
/// bootstraps the schema.
pub async fn connect_database(path: &Path) -> Result<SqlitePool, EngineError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .map_err(|e| EngineError::config(format!("invalid database path '{}': {}", path.display(), e)))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| EngineError::database(format!("failed to open database '{}': {}", path.display(), e)))?;
    schema::ensure_schema(&pool).await?;
    Ok(pool)
}
