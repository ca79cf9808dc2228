// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Domain Events
//!
//! Typed events published on the in-process event bus. Every event carries
//! `{event_id, kind, occurred_at, correlation_id}` through the
//! [`DomainEvent`] accessor surface; handlers register per [`EventKind`].
//!
//! Delivery is best-effort fan-out: handlers are invoked independently and a
//! handler's failure never suppresses the others. No ordering is guaranteed
//! among handlers of one publish, nor across events of one correlation ID —
//! handlers must not assume causal ordering beyond what they can observe
//! through metadata queries.
//!
//! Events emitted by the core:
//! - `ChunkStored` — a chunk blob became durable at a provider
//! - `FileProcessed` — every chunk of a file was observed `Stored`
//! - `FileDiscovered` — the directory scanner registered a file
//! - `DirectoryScan` — a scan finished (or aborted) with its tallies

use crate::value_objects::{CorrelationId, FileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminant used for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ChunkStored,
    FileProcessed,
    FileDiscovered,
    DirectoryScan,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ChunkStored => "ChunkStored",
            EventKind::FileProcessed => "FileProcessed",
            EventKind::FileDiscovered => "FileDiscovered",
            EventKind::DirectoryScan => "DirectoryScan",
        }
    }
}

/// Common accessor surface over every event variant.
pub trait DomainEvent {
    fn event_id(&self) -> Uuid;
    fn kind(&self) -> EventKind;
    fn occurred_at(&self) -> DateTime<Utc>;
    fn correlation_id(&self) -> &CorrelationId;
}

/// Domain events for storage operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageEvent {
    ChunkStored(ChunkStoredEvent),
    FileProcessed(FileProcessedEvent),
    FileDiscovered(FileDiscoveredEvent),
    DirectoryScan(DirectoryScanEvent),
}

impl DomainEvent for StorageEvent {
    fn event_id(&self) -> Uuid {
        match self {
            StorageEvent::ChunkStored(e) => e.event_id,
            StorageEvent::FileProcessed(e) => e.event_id,
            StorageEvent::FileDiscovered(e) => e.event_id,
            StorageEvent::DirectoryScan(e) => e.event_id,
        }
    }

    fn kind(&self) -> EventKind {
        match self {
            StorageEvent::ChunkStored(_) => EventKind::ChunkStored,
            StorageEvent::FileProcessed(_) => EventKind::FileProcessed,
            StorageEvent::FileDiscovered(_) => EventKind::FileDiscovered,
            StorageEvent::DirectoryScan(_) => EventKind::DirectoryScan,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StorageEvent::ChunkStored(e) => e.occurred_at,
            StorageEvent::FileProcessed(e) => e.occurred_at,
            StorageEvent::FileDiscovered(e) => e.occurred_at,
            StorageEvent::DirectoryScan(e) => e.occurred_at,
        }
    }

    fn correlation_id(&self) -> &CorrelationId {
        match self {
            StorageEvent::ChunkStored(e) => &e.correlation_id,
            StorageEvent::FileProcessed(e) => &e.correlation_id,
            StorageEvent::FileDiscovered(e) => &e.correlation_id,
            StorageEvent::DirectoryScan(e) => &e.correlation_id,
        }
    }
}

/// A chunk blob became durable at its provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkStoredEvent {
    pub event_id: Uuid,
    /// `"{file_id}_{sequence}"`; the recovery path when `file_id` is empty
    pub chunk_id: String,
    /// May be empty on events replayed from older descriptors
    pub file_id: String,
    pub sequence_number: u64,
    pub storage_provider_id: String,
    pub compressed_size: u64,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: CorrelationId,
}

impl ChunkStoredEvent {
    pub fn new(
        chunk_id: String,
        file_id: &FileId,
        sequence_number: u64,
        storage_provider_id: String,
        compressed_size: u64,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            chunk_id,
            file_id: file_id.to_string(),
            sequence_number,
            storage_provider_id,
            compressed_size,
            occurred_at: Utc::now(),
            correlation_id,
        }
    }
}

/// Every chunk of a file has been observed `Stored`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProcessedEvent {
    pub event_id: Uuid,
    pub file_id: String,
    pub chunk_count: u32,
    pub total_bytes: u64,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: CorrelationId,
}

impl FileProcessedEvent {
    pub fn new(file_id: &FileId, chunk_count: u32, total_bytes: u64, correlation_id: CorrelationId) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            file_id: file_id.to_string(),
            chunk_count,
            total_bytes,
            occurred_at: Utc::now(),
            correlation_id,
        }
    }
}

/// The directory scanner registered a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiscoveredEvent {
    pub event_id: Uuid,
    pub file_id: String,
    pub full_path: String,
    pub size: u64,
    pub content_processed: bool,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: CorrelationId,
}

impl FileDiscoveredEvent {
    pub fn new(
        file_id: &FileId,
        full_path: String,
        size: u64,
        content_processed: bool,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            file_id: file_id.to_string(),
            full_path,
            size,
            content_processed,
            occurred_at: Utc::now(),
            correlation_id,
        }
    }
}

/// A directory scan finished with its tallies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryScanEvent {
    pub event_id: Uuid,
    pub root_path: String,
    pub directories_seen: u64,
    pub files_seen: u64,
    pub errors: u64,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: CorrelationId,
}

impl DirectoryScanEvent {
    pub fn new(
        root_path: String,
        directories_seen: u64,
        files_seen: u64,
        errors: u64,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            root_path,
            directories_seen,
            files_seen,
            errors,
            occurred_at: Utc::now(),
            correlation_id,
        }
    }
}
