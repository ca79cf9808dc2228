// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Descriptor Entity
//!
//! Metadata record for one stored chunk blob: where it lives
//! (`storage_provider_id` + `storage_path`), what it contains (plaintext
//! `size` and `checksum`), and how it is encoded (`is_compressed`,
//! `compressed_size`).
//!
//! The chunk manager owns chunk transitions up to and including `Stored`;
//! the descriptor ID follows the `"{file_id}_{sequence_number}"` chunk-key
//! convention so the owning file is recoverable from the ID alone.

use crate::value_objects::{ChunkKey, CorrelationId, FileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chunk lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkStatus {
    Processing,
    Stored,
    Error,
}

/// Metadata record for one chunk of a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    /// `"{file_id}_{sequence_number}"`
    pub id: String,
    pub file_id: FileId,
    /// 0-based, contiguous within a completed file
    pub sequence_number: u64,
    /// Plaintext length in bytes
    pub size: u64,
    /// Stored blob length (equals `size` when not compressed)
    pub compressed_size: u64,
    /// SHA-256 of the plaintext, hex-encoded
    pub checksum: String,
    pub storage_provider_id: String,
    /// Opaque locator understood by the provider that wrote the blob
    pub storage_path: String,
    pub is_compressed: bool,
    pub status: ChunkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub storage_timestamp: Option<DateTime<Utc>>,
    pub last_access_time: Option<DateTime<Utc>>,
    pub correlation_id: CorrelationId,
}

impl ChunkDescriptor {
    /// Creates a descriptor in `Processing` state, before the blob is durable
    pub fn new(
        file_id: FileId,
        sequence_number: u64,
        size: u64,
        checksum: String,
        correlation_id: CorrelationId,
    ) -> Self {
        let now = Utc::now();
        ChunkDescriptor {
            id: ChunkKey::new(&file_id, sequence_number).into_string(),
            file_id,
            sequence_number,
            size,
            compressed_size: size,
            checksum,
            storage_provider_id: String::new(),
            storage_path: String::new(),
            is_compressed: false,
            status: ChunkStatus::Processing,
            created_at: now,
            updated_at: now,
            storage_timestamp: None,
            last_access_time: None,
            correlation_id,
        }
    }

    /// The storage key for this chunk's blob
    pub fn key(&self) -> ChunkKey {
        ChunkKey::new(&self.file_id, self.sequence_number)
    }

    /// Records the compressed encoding chosen for the blob
    pub fn with_compression(mut self, compressed_size: u64) -> Self {
        self.is_compressed = true;
        self.compressed_size = compressed_size;
        self
    }

    /// Marks the chunk durable at the given placement: -> `Stored`
    pub fn mark_stored(&mut self, provider_id: impl Into<String>, storage_path: impl Into<String>) {
        self.storage_provider_id = provider_id.into();
        self.storage_path = storage_path.into();
        self.status = ChunkStatus::Stored;
        self.storage_timestamp = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Marks the chunk failed after a provider error
    pub fn mark_error(&mut self) {
        self.status = ChunkStatus::Error;
        self.updated_at = Utc::now();
    }

    /// Records a read without touching any other field
    pub fn record_access(&mut self) {
        self.last_access_time = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}
