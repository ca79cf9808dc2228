// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Service Port
//!
//! Sync, CPU-bound compression contract used by the chunk pipeline. The
//! infrastructure layer supplies the codec; the domain only fixes the level
//! range (0-9) and the per-chunk call shape.
//!
//! Compression is applied opportunistically: the chunk manager keeps the
//! compressed form only when it is strictly smaller than the plaintext, and
//! records the choice on the chunk descriptor (`is_compressed`).

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Compression level, clamped to the 0-9 range the engine exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    pub const MIN: u32 = 0;
    pub const MAX: u32 = 9;

    /// Creates a level with validation
    pub fn new(level: u32) -> Result<Self, EngineError> {
        if level > Self::MAX {
            return Err(EngineError::config(format!(
                "compression level {} exceeds maximum of {}",
                level,
                Self::MAX
            )));
        }
        Ok(CompressionLevel(level))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel(6)
    }
}

/// Per-chunk compression codec.
///
/// Implementations are stateless and thread-safe; a single instance serves
/// every concurrent chunk worker.
pub trait CompressionService: Send + Sync {
    /// Codec name recorded in logs ("gzip", ...)
    fn algorithm(&self) -> &str;

    /// Compresses one chunk's plaintext at the given level
    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>, EngineError>;

    /// Inverse of [`CompressionService::compress`]
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert!(CompressionLevel::new(0).is_ok());
        assert!(CompressionLevel::new(9).is_ok());
        assert!(CompressionLevel::new(10).is_err());
        assert_eq!(CompressionLevel::default().value(), 6);
    }
}
