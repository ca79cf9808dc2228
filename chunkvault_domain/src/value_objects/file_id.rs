// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File ID Value Object
//!
//! Stable string identifier for a file descriptor, assigned on creation and
//! never reused. IDs are ULIDs: 26-character Crockford base32, lexically
//! sortable by creation time, which keeps document-store range scans in
//! insertion order for free.
//!
//! The file ID is the prefix of every chunk key belonging to the file
//! (`"{file_id}_{sequence}"`), so it must never contain the `_` separator —
//! ULIDs satisfy that by construction.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a [`crate::entities::FileDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Generates a new ULID-backed file ID
    pub fn generate() -> Self {
        FileId(Ulid::new().to_string())
    }

    /// Parses an ID from its string form.
    ///
    /// # Errors
    /// Returns [`EngineError::Validation`] when the input is empty or
    /// contains the chunk-key separator `_`.
    pub fn parse(id: impl Into<String>) -> Result<Self, EngineError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EngineError::validation("file id cannot be empty"));
        }
        if id.contains('_') {
            return Err(EngineError::validation(format!(
                "file id '{}' must not contain '_'",
                id
            )));
        }
        Ok(FileId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_sortable_and_unique() {
        let a = FileId::generate();
        let b = FileId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
    }

    #[test]
    fn test_parse_rejects_separator() {
        assert!(FileId::parse("abc_0").is_err());
        assert!(FileId::parse("").is_err());
        assert!(FileId::parse("01ARZ3NDEKTSV4RRFFQ69G5FAV").is_ok());
    }
}
