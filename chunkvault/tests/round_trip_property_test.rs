// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Property-based round-trip coverage: for arbitrary byte sequences the
//! engine uploads, downloading yields exactly the original bytes. Payload
//! lengths are drawn from all three sizing tiers (below the minimum chunk
//! size, around the default tier, and above sixteen times the default where
//! the power-of-two rule kicks in), with both compressible and
//! incompressible content.

mod common;

use chunkvault::application::commands::{DownloadFileCommand, UploadFileCommand};
use proptest::prelude::*;

/// Deterministic content for a `(len, seed, compressible)` triple. The
/// compressible form repeats a seeded 251-byte pattern; the incompressible
/// form is xorshift output gzip cannot shrink.
fn synth_bytes(len: usize, seed: u64, compressible: bool) -> Vec<u8> {
    if compressible {
        let pattern: Vec<u8> = (0..251u64)
            .map(|i| (i.wrapping_mul(31).wrapping_add(seed) % 251) as u8)
            .collect();
        (0..len).map(|i| pattern[i % pattern.len()]).collect()
    } else {
        let mut state = seed | 1;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 32) as u8
            })
            .collect()
    }
}

// Tier bounds follow the test settings in `common` (min 64 KiB, default
// 256 KiB, max 1 MiB): single-chunk, default-sized, and tiered-up inputs.
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    let lengths = prop_oneof![
        0usize..(64 * 1024),
        (200usize * 1024)..(1024 * 1024),
        (4usize * 1024 * 1024 + 1)..(5usize * 1024 * 1024),
    ];
    (lengths, any::<u64>(), any::<bool>()).prop_map(|(len, seed, compressible)| synth_bytes(len, seed, compressible))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 12,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_upload_download_round_trip(bytes in payload_strategy()) {
        let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
        let (restored, chunk_count, expected_chunks) = runtime.block_on(async {
            let test = common::engine().await;
            let source = test.scratch.path().join("payload.bin");
            tokio::fs::write(&source, &bytes).await.unwrap();

            let descriptor = test
                .engine
                .dispatcher
                .upload(UploadFileCommand::new(source))
                .await
                .unwrap();

            let out = test.scratch.path().join("restored.bin");
            test.engine
                .dispatcher
                .download(DownloadFileCommand::new(descriptor.id.to_string(), out.clone()))
                .await
                .unwrap();
            let restored = tokio::fs::read(&out).await.unwrap();

            let expected_chunks = test
                .settings
                .chunking
                .size_policy()
                .unwrap()
                .chunks_needed(bytes.len() as u64);
            (restored, u64::from(descriptor.chunk_count), expected_chunks)
        });

        prop_assert_eq!(chunk_count, expected_chunks);
        prop_assert!(restored == bytes, "round-trip mismatch for {} byte payload", bytes.len());
    }
}
