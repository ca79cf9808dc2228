// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Checksum Service
//!
//! SHA-256 checksumming for chunks and whole files. Checksums are a domain
//! concern: every chunk descriptor carries the hash of its plaintext, and a
//! completed file's checksum equals the hash of its chunks' concatenated
//! plaintext in sequence order.
//!
//! Two shapes are provided: a one-shot helper for chunk-sized buffers and a
//! streaming [`StreamingChecksum`] that the upload path feeds incrementally
//! while teeing bytes into the chunk pipeline.

use sha2::{Digest, Sha256};

/// Computes the hex-encoded SHA-256 of a buffer
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Incrementally accumulated SHA-256 over a byte stream.
#[derive(Debug, Default)]
pub struct StreamingChecksum {
    hasher: Sha256,
    bytes_seen: u64,
}

impl StreamingChecksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next span of plaintext
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes_seen += data.len() as u64;
    }

    /// Total bytes fed so far
    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }

    /// Consumes the accumulator and yields the hex digest
    pub fn finalize(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Verifies a buffer against an expected hex digest
pub fn verify_sha256(data: &[u8], expected_hex: &str) -> bool {
    sha256_hex(data) == expected_hex
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known digest of the empty string
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
        assert_eq!(StreamingChecksum::new().finalize(), EMPTY_SHA256);
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut streaming = StreamingChecksum::new();
        for span in data.chunks(7) {
            streaming.update(span);
        }
        assert_eq!(streaming.bytes_seen(), data.len() as u64);
        assert_eq!(streaming.finalize(), sha256_hex(data));
    }

    #[test]
    fn test_verify_detects_mismatch() {
        assert!(verify_sha256(b"abc", &sha256_hex(b"abc")));
        assert!(!verify_sha256(b"abd", &sha256_hex(b"abc")));
    }
}
