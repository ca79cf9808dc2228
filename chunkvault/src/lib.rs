// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ChunkVault
//!
//! Chunked, content-addressed file storage engine. Files and directory
//! trees are split into fixed-boundary chunks; each chunk is independently
//! compressed, checksummed, and dispatched to one of several pluggable
//! storage backends. Metadata lives in a SQLite-backed document store
//! fronted by a write-through cache; every user-visible operation flows
//! through a middleware-decorated command dispatcher and publishes typed
//! events on an in-process bus.
//!
//! ## Layers
//!
//! - [`application`] — commands, dispatcher/middleware, chunk manager, file
//!   service, directory scanner, chunk lifecycle
//! - [`infrastructure`] — storage providers, repositories, caches, codec,
//!   event bus, configuration
//! - [`presentation`] — the CLI front-end
//! - [`startup`] — the composition root wiring everything explicitly
//!
//! The pure domain model lives in the `chunkvault-domain` crate; process
//! lifecycle (signals, exit codes) in `chunkvault-bootstrap`.

pub mod application;
pub mod infrastructure;
pub mod presentation;
pub mod startup;
