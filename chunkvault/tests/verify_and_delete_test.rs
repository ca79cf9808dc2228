// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Integrity-check and deletion behavior: deep verify catching a corrupted
//! blob by sequence, shallow verify passing on metadata alone, idempotent
//! delete, and the strict-delete variant.

mod common;

use chunkvault::application::commands::{DeleteFileCommand, DownloadFileCommand, UploadFileCommand, VerifyFileCommand};
use chunkvault_domain::OperationContext;
use std::path::PathBuf;

async fn upload(test: &common::TestEngine, name: &str, bytes: &[u8]) -> chunkvault_domain::FileDescriptor {
    let path = test.scratch.path().join(name);
    tokio::fs::write(&path, bytes).await.unwrap();
    test.engine
        .dispatcher
        .upload(UploadFileCommand::new(path))
        .await
        .unwrap()
}

/// Flips one byte in the blob of the chunk with the given sequence. The
/// first chunk of every upload lands on the filesystem provider (fixed
/// round-robin start), so its blob is a plain file under the configured
/// root.
async fn corrupt_filesystem_chunk(test: &common::TestEngine, descriptor: &chunkvault_domain::FileDescriptor, sequence: u64) {
    let ctx = OperationContext::new();
    let chunks = test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap();
    let chunk = chunks.iter().find(|c| c.sequence_number == sequence).unwrap();
    assert_eq!(chunk.storage_provider_id, "filesystem");

    let blob_path = PathBuf::from(&test.settings.storage.filesystem_root).join(&chunk.storage_path);
    let mut blob = tokio::fs::read(&blob_path).await.unwrap();
    let target = blob.len() / 2;
    blob[target] ^= 0xFF;
    tokio::fs::write(&blob_path, &blob).await.unwrap();
}

#[tokio::test]
async fn test_deep_verify_names_corrupted_sequence() {
    let test = common::engine().await;
    let descriptor = upload(&test, "victim.bin", &common::payload(768 * 1024)).await;

    corrupt_filesystem_chunk(&test, &descriptor, 0).await;

    // Shallow verification only inspects metadata and still passes.
    let shallow = test
        .engine
        .dispatcher
        .verify(VerifyFileCommand::new(descriptor.id.to_string(), false))
        .await
        .unwrap();
    assert!(shallow.is_valid());

    // Deep verification reads the blob and pins the failure on sequence 0.
    let deep = test
        .engine
        .dispatcher
        .verify(VerifyFileCommand::new(descriptor.id.to_string(), true))
        .await
        .unwrap();
    assert!(!deep.is_valid());
    assert_eq!(deep.mismatched_sequences, vec![0]);

    let err = deep.into_result().unwrap_err();
    assert_eq!(err.category(), "integrity");
    assert!(err.to_string().contains('0'));
}

#[tokio::test]
async fn test_download_of_corrupted_file_fails() {
    let test = common::engine().await;
    let descriptor = upload(&test, "victim.bin", &common::payload(768 * 1024)).await;
    corrupt_filesystem_chunk(&test, &descriptor, 0).await;

    let out = test.scratch.path().join("restored.bin");
    let err = test
        .engine
        .dispatcher
        .download(DownloadFileCommand::new(descriptor.id.to_string(), out))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "integrity");
}

#[tokio::test]
async fn test_delete_is_idempotent_and_removes_blobs() {
    let test = common::engine().await;
    let descriptor = upload(&test, "doomed.bin", &common::payload(768 * 1024)).await;

    let ctx = OperationContext::new();
    let chunks = test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap();
    assert_eq!(chunks.len(), 3);

    let first = test
        .engine
        .dispatcher
        .delete(DeleteFileCommand::new(descriptor.id.to_string()))
        .await
        .unwrap();
    assert!(first);

    // Second delete of the same file succeeds as well.
    let second = test
        .engine
        .dispatcher
        .delete(DeleteFileCommand::new(descriptor.id.to_string()))
        .await
        .unwrap();
    assert!(second);

    // Descriptors and blobs are both gone.
    assert!(test
        .engine
        .file_repository
        .get_by_id(&descriptor.id, &ctx)
        .await
        .unwrap()
        .is_none());
    assert!(test
        .engine
        .chunk_repository
        .get_chunks_by_file_id(&descriptor.id, &ctx)
        .await
        .unwrap()
        .is_empty());
    for chunk in &chunks {
        let provider = test
            .engine
            .provider_registry
            .resolve(&chunk.storage_provider_id)
            .unwrap();
        assert!(!provider
            .chunk_exists(&chunk.key(), &chunk.storage_path, &ctx)
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn test_strict_delete_of_missing_file_fails() {
    let test = common::engine().await;
    let mut command = DeleteFileCommand::new("01ARZ3NDEKTSV4RRFFQ69G5FAV");
    command.strict = true;
    let err = test.engine.dispatcher.delete(command).await.unwrap_err();
    assert_eq!(err.category(), "not_found");
}

#[tokio::test]
async fn test_verify_missing_file_is_not_found() {
    let test = common::engine().await;
    let err = test
        .engine
        .dispatcher
        .verify(VerifyFileCommand::new("01ARZ3NDEKTSV4RRFFQ69G5FAV", true))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "not_found");
}
