// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain services and infrastructure ports.
//!
//! Sync services (checksums, distribution) are pure CPU-bound logic and live
//! here with their implementations. Async traits (storage provider, cache,
//! repositories) are ports whose implementations live in the infrastructure
//! layer.

pub mod cache_service;
pub mod checksum_service;
pub mod compression_service;
pub mod distribution_strategy;
pub mod storage_provider;

pub use cache_service::CacheService;
pub use checksum_service::{sha256_hex, verify_sha256, StreamingChecksum};
pub use compression_service::{CompressionLevel, CompressionService};
pub use distribution_strategy::{DistributionStrategy, RoundRobinStrategy};
pub use storage_provider::StorageProvider;
