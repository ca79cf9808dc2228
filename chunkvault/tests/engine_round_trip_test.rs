// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end upload/download tests over the fully wired engine: byte-exact
//! round-trips, chunk sizing scenarios, manifest integrity, compression
//! soundness, provider resolution, and round-robin placement.

mod common;

use chunkvault::application::commands::{DownloadFileCommand, ListFilesCommand, UploadFileCommand};
use chunkvault_domain::{ChunkStatus, FileId, FileStatus, OperationContext};
use std::collections::HashMap;
use std::path::PathBuf;

async fn write_source(test: &common::TestEngine, name: &str, bytes: &[u8]) -> PathBuf {
    let path = test.scratch.path().join(name);
    tokio::fs::write(&path, bytes).await.unwrap();
    path
}

async fn upload(test: &common::TestEngine, name: &str, bytes: &[u8]) -> chunkvault_domain::FileDescriptor {
    let path = write_source(test, name, bytes).await;
    test.engine
        .dispatcher
        .upload(UploadFileCommand::new(path))
        .await
        .unwrap()
}

async fn download(test: &common::TestEngine, id: &str) -> Vec<u8> {
    let out = test.scratch.path().join(format!("{}.out", id));
    test.engine
        .dispatcher
        .download(DownloadFileCommand::new(id.to_string(), out.clone()))
        .await
        .unwrap();
    tokio::fs::read(&out).await.unwrap()
}

#[tokio::test]
async fn test_round_trip_multi_chunk_file() {
    let test = common::engine().await;
    // Not a multiple of the 256 KiB chunk size: the final chunk is short.
    let bytes = common::payload(700_001);
    let descriptor = upload(&test, "data.bin", &bytes).await;

    assert_eq!(descriptor.status, FileStatus::Completed);
    assert_eq!(descriptor.size, Some(bytes.len() as u64));
    assert_eq!(descriptor.chunk_count, 3);
    assert!(descriptor.checksum.is_some());

    let restored = download(&test, descriptor.id.as_str()).await;
    assert_eq!(restored, bytes);
}

#[tokio::test]
async fn test_empty_file_round_trip() {
    // Zero-byte upload: chunk_count = 0, Completed, download yields nothing.
    let test = common::engine().await;
    let descriptor = upload(&test, "empty.bin", b"").await;

    assert_eq!(descriptor.status, FileStatus::Completed);
    assert_eq!(descriptor.size, Some(0));
    assert_eq!(descriptor.chunk_count, 0);

    let ctx = OperationContext::new();
    let chunks = test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap();
    assert!(chunks.is_empty());

    let restored = download(&test, descriptor.id.as_str()).await;
    assert!(restored.is_empty());
}

#[tokio::test]
async fn test_exact_multiple_splits_into_equal_chunks() {
    // 3 x 256 KiB at the 256 KiB default: exactly three full chunks.
    let test = common::engine().await;
    let chunk_size = test.settings.chunking.default_chunk_size_bytes;
    let bytes = common::payload((3 * chunk_size) as usize);
    let descriptor = upload(&test, "three.bin", &bytes).await;
    assert_eq!(descriptor.chunk_count, 3);

    let ctx = OperationContext::new();
    let chunks = test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap();
    let sequences: Vec<u64> = chunks.iter().map(|c| c.sequence_number).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
    for chunk in &chunks {
        assert_eq!(chunk.size, chunk_size);
        assert_eq!(chunk.status, ChunkStatus::Stored);
    }
}

#[tokio::test]
async fn test_manifest_and_placement_invariants() {
    let test = common::engine().await;
    let bytes = common::payload(768 * 1024); // 3 chunks across 3 providers
    let descriptor = upload(&test, "spread.bin", &bytes).await;

    let ctx = OperationContext::new();
    let chunks = test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap();
    assert_eq!(chunks.len(), 3);

    // Round-robin over the three registered providers: one chunk each,
    // and every recorded placement resolves to a provider that can see the
    // blob.
    let mut per_provider: HashMap<String, u64> = HashMap::new();
    for chunk in &chunks {
        *per_provider.entry(chunk.storage_provider_id.clone()).or_default() += 1;
        let provider = test
            .engine
            .provider_registry
            .resolve(&chunk.storage_provider_id)
            .unwrap();
        assert!(provider
            .chunk_exists(&chunk.key(), &chunk.storage_path, &ctx)
            .await
            .unwrap());
    }
    assert_eq!(per_provider.len(), 3);
    assert!(per_provider.values().all(|&count| count == 1));

    // Compression soundness: the patterned payload compresses, and the
    // stored form still round-trips through deep verification.
    for chunk in &chunks {
        assert!(chunk.is_compressed);
        assert!(chunk.compressed_size < chunk.size);
    }
    let report = test
        .engine
        .dispatcher
        .verify(chunkvault::application::commands::VerifyFileCommand::new(
            descriptor.id.to_string(),
            true,
        ))
        .await
        .unwrap();
    assert!(report.is_valid());
    assert_eq!(report.file_checksum_match, Some(true));
}

#[tokio::test]
async fn test_incompressible_chunks_are_stored_raw() {
    let test = common::engine().await;
    // Pseudo-random bytes do not shrink under gzip; the pipeline must keep
    // the plaintext form and mark the chunk uncompressed.
    let mut state = 0x2545F4914F6CDD1Du64;
    let bytes: Vec<u8> = (0..300_000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 32) as u8
        })
        .collect();
    let descriptor = upload(&test, "noise.bin", &bytes).await;

    let ctx = OperationContext::new();
    let chunks = test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap();
    assert!(chunks.iter().all(|c| !c.is_compressed));
    assert!(chunks.iter().all(|c| c.compressed_size == c.size));

    let restored = download(&test, descriptor.id.as_str()).await;
    assert_eq!(restored, bytes);
}

#[tokio::test]
async fn test_list_shows_uploaded_files() {
    let test = common::engine().await;
    let first = upload(&test, "a.bin", &common::payload(1000)).await;
    let second = upload(&test, "b.bin", &common::payload(2000)).await;

    let listed = test
        .engine
        .dispatcher
        .list(ListFilesCommand::new())
        .await
        .unwrap();
    let ids: Vec<&FileId> = listed.iter().map(|f| &f.id).collect();
    assert!(ids.contains(&&first.id));
    assert!(ids.contains(&&second.id));
}
