// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Distribution Strategy
//!
//! Write-time policy selecting which registered provider receives the next
//! chunk. Strategy is write-time only: reads resolve the provider recorded
//! in the chunk descriptor, never the strategy.
//!
//! [`RoundRobinStrategy`] is the required baseline; weighted, size-tier, or
//! tag-based policies plug in through the same trait.

use crate::error::EngineError;
use crate::services::StorageProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Policy choosing a provider for the chunk about to be written.
pub trait DistributionStrategy: Send + Sync {
    /// Strategy name for logs and configuration matching
    fn name(&self) -> &str;

    /// Picks one of the registered providers.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] when no providers are registered.
    fn select(&self, providers: &[Arc<dyn StorageProvider>]) -> Result<Arc<dyn StorageProvider>, EngineError>;
}

/// Rotates through the registered providers with a single atomic counter.
///
/// With `N` providers and a fixed starting counter the selection sequence is
/// deterministic, so `k * N` sequential writes land exactly `k` chunks on
/// each provider.
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    counter: AtomicUsize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the rotation at a fixed offset (used by tests for determinism)
    pub fn starting_at(offset: usize) -> Self {
        RoundRobinStrategy {
            counter: AtomicUsize::new(offset),
        }
    }
}

impl DistributionStrategy for RoundRobinStrategy {
    fn name(&self) -> &str {
        "round-robin"
    }

    fn select(&self, providers: &[Arc<dyn StorageProvider>]) -> Result<Arc<dyn StorageProvider>, EngineError> {
        if providers.is_empty() {
            return Err(EngineError::config("no storage providers registered"));
        }
        let slot = self.counter.fetch_add(1, Ordering::Relaxed) % providers.len();
        Ok(Arc::clone(&providers[slot]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ChunkKey, OperationContext};
    use async_trait::async_trait;
    use proptest::prelude::*;

    struct StubProvider {
        id: String,
    }

    #[async_trait]
    impl StorageProvider for StubProvider {
        fn provider_id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> &str {
            "stub"
        }

        async fn write_chunk(
            &self,
            _key: &ChunkKey,
            _data: &[u8],
            _ctx: &OperationContext,
        ) -> Result<String, EngineError> {
            Ok(String::new())
        }

        async fn read_chunk(
            &self,
            _key: &ChunkKey,
            _storage_path: &str,
            _ctx: &OperationContext,
        ) -> Result<Vec<u8>, EngineError> {
            Ok(Vec::new())
        }

        async fn chunk_exists(
            &self,
            _key: &ChunkKey,
            _storage_path: &str,
            _ctx: &OperationContext,
        ) -> Result<bool, EngineError> {
            Ok(false)
        }

        async fn delete_chunk(
            &self,
            _key: &ChunkKey,
            _storage_path: &str,
            _ctx: &OperationContext,
        ) -> Result<bool, EngineError> {
            Ok(true)
        }
    }

    fn providers(n: usize) -> Vec<Arc<dyn StorageProvider>> {
        (0..n)
            .map(|i| Arc::new(StubProvider { id: format!("p{}", i) }) as Arc<dyn StorageProvider>)
            .collect()
    }

    #[test]
    fn test_round_robin_is_fair() {
        let strategy = RoundRobinStrategy::starting_at(0);
        let pool = providers(3);
        let mut counts = vec![0usize; 3];
        for _ in 0..12 {
            let picked = strategy.select(&pool).unwrap();
            let idx = pool.iter().position(|p| p.provider_id() == picked.provider_id()).unwrap();
            counts[idx] += 1;
        }
        assert_eq!(counts, vec![4, 4, 4]);
    }

    #[test]
    fn test_round_robin_deterministic_from_fixed_start() {
        let pool = providers(2);
        let strategy = RoundRobinStrategy::starting_at(0);
        let order: Vec<String> = (0..4)
            .map(|_| strategy.select(&pool).unwrap().provider_id().to_string())
            .collect();
        assert_eq!(order, vec!["p0", "p1", "p0", "p1"]);
    }

    #[test]
    fn test_empty_pool_is_a_config_error() {
        let strategy = RoundRobinStrategy::new();
        assert!(strategy.select(&[]).is_err());
    }

    proptest! {
        /// Across k * N sequential selections, every one of the N providers
        /// is picked exactly k times, whatever the pool size, rotation
        /// count, or starting counter.
        #[test]
        fn prop_round_robin_is_exactly_fair(n in 2usize..8, k in 1usize..50, start in 0usize..100) {
            let strategy = RoundRobinStrategy::starting_at(start);
            let pool = providers(n);
            let mut counts = vec![0usize; n];
            for _ in 0..k * n {
                let picked = strategy.select(&pool).unwrap();
                let idx = pool
                    .iter()
                    .position(|p| p.provider_id() == picked.provider_id())
                    .unwrap();
                counts[idx] += 1;
            }
            prop_assert!(counts.iter().all(|&count| count == k), "uneven selection: {:?}", counts);
        }
    }
}
