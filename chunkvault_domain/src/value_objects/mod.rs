// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects: immutable, self-validating, compared by value.

pub mod chunk_key;
pub mod chunk_size;
pub mod correlation_id;
pub mod file_id;
pub mod operation_context;

pub use chunk_key::ChunkKey;
pub use chunk_size::ChunkSizePolicy;
pub use correlation_id::CorrelationId;
pub use file_id::FileId;
pub use operation_context::{CancellationFlag, OperationContext};
