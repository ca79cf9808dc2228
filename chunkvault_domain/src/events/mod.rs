// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain events published on the in-process bus.

pub mod storage_events;

pub use storage_events::{
    ChunkStoredEvent, DirectoryScanEvent, DomainEvent, EventKind, FileDiscoveredEvent, FileProcessedEvent,
    StorageEvent,
};
