// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Correlation ID Value Object
//!
//! Per-operation tracing identifier propagated through every component and
//! every log line. The ID is passed explicitly as a parameter (usually inside
//! an [`crate::value_objects::OperationContext`]) rather than through ambient
//! thread-local context; logging adapters mirror it into their own fields for
//! enrichment.
//!
//! A correlation ID is assigned when a command enters the dispatcher and
//! survives across the chunk pipeline, the repositories, the cache, the event
//! bus, and the providers, so a single upload can be reconstructed from logs
//! end to end.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tracing identifier for one user-visible operation.
///
/// Compared by value; cheap to clone. The string form is a lowercase
/// hyphenated UUID, which is what ends up in persisted descriptors and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generates a fresh correlation ID
    pub fn generate() -> Self {
        CorrelationId(Uuid::new_v4().to_string())
    }

    /// Wraps an identifier received from an upstream caller.
    ///
    /// Empty input falls back to a generated ID so downstream logs never
    /// carry a blank correlation field.
    pub fn from_caller(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::generate()
        } else {
            CorrelationId(id)
        }
    }

    /// Gets the string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn test_empty_caller_id_falls_back_to_generated() {
        let cid = CorrelationId::from_caller("  ");
        assert!(!cid.as_str().trim().is_empty());
    }

    #[test]
    fn test_caller_id_preserved() {
        let cid = CorrelationId::from_caller("op-1234");
        assert_eq!(cid.as_str(), "op-1234");
    }
}
