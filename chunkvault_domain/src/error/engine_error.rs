// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error type shared by every layer of the storage
//! engine. Errors are categorized by failure kind rather than by source type,
//! so callers can apply a uniform policy per category regardless of which
//! backend produced the failure.
//!
//! ## Error Categories
//!
//! ### Caller errors
//! - **Validation**: command input failed declarative validation; never
//!   retried, surfaced to the caller before any I/O happens
//! - **NotFound**: a file or chunk descriptor is missing; deletes tolerate
//!   it, reads fail with it
//!
//! ### Storage errors
//! - **Storage**: a provider I/O call failed (including timeouts); carries
//!   the provider ID and the original cause
//! - **Integrity**: checksum mismatch, missing or duplicate sequence number,
//!   or size mismatch; always fatal to the enclosing operation
//! - **Cache**: a cache access failed; advisory only — callers log it and
//!   fall back to the repository
//!
//! ### Infrastructure errors
//! - **Database**: document-store operation failed
//! - **Serialization**: descriptor (de)serialization failed
//! - **Io**: local filesystem or stream I/O failed
//! - **Timeout**: an operation exceeded its deadline outside a provider call
//!
//! ### Control flow
//! - **Canceled**: the cancellation signal was observed; the enclosing file
//!   operation transitions to `Failed`
//! - **Config / Internal**: startup misconfiguration and unexpected states
//!
//! ## Propagation Policy
//!
//! Middleware never swallows errors; they bubble to the dispatcher caller
//! with the correlation ID attached in the logs. Event handlers catch their
//! own errors to preserve isolation between handlers. Cache errors are the
//! single advisory category — everything else aborts the operation that
//! observed it.

use thiserror::Error;

/// Error type for the chunked storage engine.
///
/// Each variant represents a failure *kind*, not a failure source: a timeout
/// inside a provider call is a [`EngineError::Storage`] (the chunk manager
/// treats it like any other provider failure), while a missing descriptor is
/// a [`EngineError::NotFound`] whether the repository or the cache noticed
/// first.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error (provider '{provider_id}'): {message}")]
    Storage { provider_id: String, message: String },

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Canceled: {0}")]
    Canceled(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Creates a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a storage error carrying the provider that failed
    pub fn storage(provider_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Storage {
            provider_id: provider_id.into(),
            message: msg.into(),
        }
    }

    /// Creates an integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Creates a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Creates a cancellation error
    pub fn canceled(msg: impl Into<String>) -> Self {
        Self::Canceled(msg.into())
    }

    /// Creates a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Creates an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Checks whether the error indicates a transient condition worth retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Timeout(_) | EngineError::Io(_) | EngineError::Cache(_)
        )
    }

    /// Checks whether the error is advisory (logged and ignored, caller
    /// falls back to the authoritative store)
    pub fn is_advisory(&self) -> bool {
        matches!(self, EngineError::Cache(_))
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::NotFound(_) => "not_found",
            EngineError::Storage { .. } => "storage",
            EngineError::Integrity(_) => "integrity",
            EngineError::Cache(_) => "cache",
            EngineError::Canceled(_) => "cancellation",
            EngineError::Database(_) => "database",
            EngineError::Serialization(_) => "serialization",
            EngineError::Io(_) => "io",
            EngineError::Timeout(_) => "timeout",
            EngineError::Config(_) => "configuration",
            EngineError::Internal(_) => "internal",
        }
    }
}

// Conversions from standard library and serialization errors
impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(EngineError::validation("x").category(), "validation");
        assert_eq!(EngineError::storage("fs-1", "boom").category(), "storage");
        assert_eq!(EngineError::integrity("bad hash").category(), "integrity");
        assert_eq!(EngineError::canceled("sigterm").category(), "cancellation");
    }

    #[test]
    fn test_storage_error_names_provider() {
        let err = EngineError::storage("document-blob", "write failed");
        assert!(err.to_string().contains("document-blob"));
        assert!(err.to_string().contains("write failed"));
    }

    #[test]
    fn test_cache_errors_are_advisory() {
        assert!(EngineError::cache("redis down").is_advisory());
        assert!(!EngineError::integrity("mismatch").is_advisory());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert_eq!(err.category(), "io");
    }
}
