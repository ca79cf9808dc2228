// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cache backends and the write-through repository decorators.

pub mod cached_repositories;
pub mod memory_cache;
pub mod redis_cache;

pub use cached_repositories::{CachedChunkMetadataRepository, CachedFileMetadataRepository};
pub use memory_cache::MemoryCacheService;
pub use redis_cache::RedisCacheService;
