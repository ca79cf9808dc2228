// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Sizing Policy
//!
//! Type-safe representation of the engine's chunk-size bounds and the sizing
//! rule applied before a split. The policy is a value object: validated at
//! creation, immutable, and compared by value.
//!
//! ## Sizing rule
//!
//! Given a plaintext size `S` and configured `{min, default, max}`:
//!
//! - `S <= min` — a single chunk
//! - `S <= 16 x default` — chunks of `default` bytes
//! - `S > 16 x default` — chunks of `min(max, next_power_of_two(S / 16))`
//!
//! Chunks are contiguous, non-overlapping, 0-indexed; the final chunk may be
//! short. When the input length is unknown (non-seekable stream) the policy
//! falls back to `default`.
//!
//! ## Bounds
//!
//! - **Minimum (hard floor 1 byte)** — zero-byte chunks are meaningless
//! - **Maximum (hard ceiling 512 MB)** — keeps per-chunk buffers bounded
//! - **Default (1 MB unless configured)** — balanced for typical files

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Validated `{min, default, max}` chunk-size configuration plus the sizing
/// rule derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSizePolicy {
    min: u64,
    default: u64,
    max: u64,
}

impl ChunkSizePolicy {
    /// Hard floor for any configured size (1 byte)
    pub const FLOOR: u64 = 1;

    /// Hard ceiling for any configured size (512 MB)
    pub const CEILING: u64 = 512 * 1024 * 1024;

    /// Default chunk size used when no configuration is supplied (1 MB)
    pub const DEFAULT_BYTES: u64 = 1024 * 1024;

    /// Creates a policy with validation.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] unless
    /// `FLOOR <= min <= default <= max <= CEILING`.
    pub fn new(min: u64, default: u64, max: u64) -> Result<Self, EngineError> {
        if min < Self::FLOOR {
            return Err(EngineError::config(format!(
                "minimum chunk size {} is below the {} byte floor",
                min,
                Self::FLOOR
            )));
        }
        if max > Self::CEILING {
            return Err(EngineError::config(format!(
                "maximum chunk size {} exceeds the {} byte ceiling",
                max,
                Self::CEILING
            )));
        }
        if !(min <= default && default <= max) {
            return Err(EngineError::config(format!(
                "chunk sizes must satisfy min <= default <= max (got {} / {} / {})",
                min, default, max
            )));
        }
        Ok(ChunkSizePolicy { min, default, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn default_size(&self) -> u64 {
        self.default
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Picks the target chunk size for a plaintext of `total_size` bytes.
    ///
    /// `None` (length unknown, e.g. a non-seekable stream) selects the
    /// configured default.
    pub fn target_for(&self, total_size: Option<u64>) -> u64 {
        let total = match total_size {
            Some(total) => total,
            None => return self.default,
        };
        if total <= self.min {
            // Single chunk; reading up to `min` bytes consumes the input.
            return self.min;
        }
        if total <= 16 * self.default {
            return self.default;
        }
        let tier = (total / 16).next_power_of_two();
        tier.min(self.max)
    }

    /// Number of chunks a `total_size`-byte plaintext splits into
    pub fn chunks_needed(&self, total_size: u64) -> u64 {
        if total_size == 0 {
            return 0;
        }
        let target = self.target_for(Some(total_size));
        total_size.div_ceil(target)
    }
}

impl Default for ChunkSizePolicy {
    fn default() -> Self {
        ChunkSizePolicy {
            min: 64 * 1024,
            default: Self::DEFAULT_BYTES,
            max: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIB: u64 = 1024 * 1024;

    fn policy() -> ChunkSizePolicy {
        ChunkSizePolicy::new(64 * 1024, MIB, 10 * MIB).unwrap()
    }

    #[test]
    fn test_validation_ordering() {
        assert!(ChunkSizePolicy::new(0, MIB, 10 * MIB).is_err());
        assert!(ChunkSizePolicy::new(2 * MIB, MIB, 10 * MIB).is_err());
        assert!(ChunkSizePolicy::new(64 * 1024, MIB, ChunkSizePolicy::CEILING + 1).is_err());
        assert!(ChunkSizePolicy::new(64 * 1024, MIB, 10 * MIB).is_ok());
    }

    #[test]
    fn test_small_input_is_single_chunk() {
        let p = policy();
        assert_eq!(p.target_for(Some(1)), 64 * 1024);
        assert_eq!(p.chunks_needed(64 * 1024), 1);
    }

    #[test]
    fn test_mid_range_uses_default() {
        // 3 MiB with 1 MiB default: exactly three chunks (scenario coverage)
        let p = policy();
        assert_eq!(p.target_for(Some(3 * MIB)), MIB);
        assert_eq!(p.chunks_needed(3 * MIB), 3);
    }

    #[test]
    fn test_large_input_tiers_up_by_power_of_two() {
        // 100 MiB / 16 = 6.25 MiB, next power of two = 8 MiB, below max
        let p = policy();
        assert_eq!(p.target_for(Some(100 * MIB)), 8 * MIB);
        // 1 GiB / 16 = 64 MiB, clamped to the 10 MiB max
        let big = ChunkSizePolicy::new(64 * 1024, MIB, 10 * MIB).unwrap();
        assert_eq!(big.target_for(Some(1024 * MIB)), 10 * MIB);
    }

    #[test]
    fn test_unknown_length_uses_default() {
        assert_eq!(policy().target_for(None), MIB);
    }

    #[test]
    fn test_zero_bytes_need_zero_chunks() {
        assert_eq!(policy().chunks_needed(0), 0);
    }

    proptest! {
        /// The selected target always stays within the configured bounds and
        /// the derived chunk count always covers the input exactly.
        #[test]
        fn prop_target_within_bounds(total in 1u64..64 * 1024 * 1024 * 1024) {
            let p = policy();
            let target = p.target_for(Some(total));
            prop_assert!(target >= p.min());
            prop_assert!(target <= p.max().max(p.min()));
            let count = p.chunks_needed(total);
            prop_assert!(count >= 1);
            prop_assert!((count - 1) * target < total);
            prop_assert!(count * target >= total);
        }
    }
}
