// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Gzip Compression Adapter
//!
//! Infrastructure implementation of the domain
//! [`CompressionService`] port over `flate2`. The engine's 0-9 level range
//! maps directly onto gzip's, so the configured `compression_level` is used
//! as-is.
//!
//! The adapter is stateless and thread-safe; one instance serves every
//! concurrent chunk worker. Compression of a single chunk is the longest
//! uninterrupted CPU stretch in the pipeline, which is why the chunk manager
//! runs it inside the bounded worker pool rather than on the read path.

use chunkvault_domain::services::compression_service::{CompressionLevel, CompressionService};
use chunkvault_domain::EngineError;
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// Gzip codec for chunk blobs.
pub struct GzipCompressionService;

impl GzipCompressionService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GzipCompressionService {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionService for GzipCompressionService {
    fn algorithm(&self) -> &str {
        "gzip"
    }

    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>, EngineError> {
        let mut output = Vec::new();
        let mut encoder = GzEncoder::new(data, Compression::new(level.value()));
        encoder
            .read_to_end(&mut output)
            .map_err(|e| EngineError::Io(format!("gzip compression failed: {}", e)))?;
        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut output = Vec::new();
        let mut decoder = GzDecoder::new(data);
        decoder
            .read_to_end(&mut output)
            .map_err(|e| EngineError::Io(format!("gzip decompression failed: {}", e)))?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let codec = GzipCompressionService::new();
        let data = b"compressible compressible compressible compressible".repeat(64);
        let compressed = codec.compress(&data, CompressionLevel::default()).unwrap();
        assert!(compressed.len() < data.len());
        let restored = codec.decompress(&compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_level_zero_stores_without_shrinking() {
        let codec = GzipCompressionService::new();
        let data = vec![7u8; 4096];
        let stored = codec.compress(&data, CompressionLevel::new(0).unwrap()).unwrap();
        assert_eq!(codec.decompress(&stored).unwrap(), data);
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let codec = GzipCompressionService::new();
        assert!(codec.decompress(b"definitely not gzip").is_err());
    }
}
