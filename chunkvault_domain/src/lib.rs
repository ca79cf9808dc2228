// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ChunkVault Domain Layer
//!
//! Pure business logic for the chunked, content-addressed storage engine:
//! entities, value objects, domain events, the error taxonomy, and the ports
//! (traits) that the infrastructure layer implements.
//!
//! ## Layer rules
//!
//! - No runtime dependency: async ports use `async-trait` and stay
//!   executor-agnostic; CPU-bound services (checksums, sizing, distribution)
//!   are sync
//! - No logging: the application layer traces around domain calls
//! - Errors are always [`EngineError`]; conversions from std/serde errors
//!   exist at the edges
//!
//! ## Map
//!
//! - [`entities`] — [`entities::FileDescriptor`], [`entities::ChunkDescriptor`]
//!   and their lifecycles
//! - [`value_objects`] — IDs, chunk keys, sizing policy, operation context
//! - [`events`] — the [`events::StorageEvent`] fan-out surface
//! - [`repositories`] — metadata persistence ports
//! - [`services`] — storage provider / cache / compression ports plus the
//!   sync checksum and distribution services

pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::{ChunkDescriptor, ChunkStatus, DescriptorKind, FileDescriptor, FileStatus};
pub use error::EngineError;
pub use events::{
    ChunkStoredEvent, DirectoryScanEvent, DomainEvent, EventKind, FileDiscoveredEvent, FileProcessedEvent,
    StorageEvent,
};
pub use repositories::{ChunkMetadataRepository, FileMetadataRepository};
pub use services::{
    sha256_hex, verify_sha256, CacheService, CompressionLevel, CompressionService, DistributionStrategy,
    RoundRobinStrategy, StorageProvider, StreamingChecksum,
};
pub use value_objects::{CancellationFlag, ChunkKey, ChunkSizePolicy, CorrelationId, FileId, OperationContext};
