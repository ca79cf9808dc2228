// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Key Value Object
//!
//! The `"{file_id}_{sequence_number}"` convention used for three things at
//! once: the storage key handed to providers, the chunk descriptor ID, and a
//! recovery path — given only a chunk key, the owning file can be re-derived
//! by splitting on the last `_`.
//!
//! [`FileId`] guarantees the file-id half never contains the separator, so
//! parsing is unambiguous.

use crate::error::EngineError;
use crate::value_objects::FileId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key identifying one stored chunk blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkKey(String);

impl ChunkKey {
    /// Builds the key for `sequence_number` of `file_id`
    pub fn new(file_id: &FileId, sequence_number: u64) -> Self {
        ChunkKey(format!("{}_{}", file_id, sequence_number))
    }

    /// Parses a key back into its file ID and sequence number.
    ///
    /// # Errors
    /// Returns [`EngineError::Validation`] when the input does not match the
    /// `"{file_id}_{sequence}"` convention.
    pub fn parse(key: &str) -> Result<(FileId, u64), EngineError> {
        let (file_part, seq_part) = key
            .rsplit_once('_')
            .ok_or_else(|| EngineError::validation(format!("malformed chunk key '{}'", key)))?;
        let sequence = seq_part
            .parse::<u64>()
            .map_err(|_| EngineError::validation(format!("malformed chunk sequence in key '{}'", key)))?;
        let file_id = FileId::parse(file_part)?;
        Ok((file_id, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
