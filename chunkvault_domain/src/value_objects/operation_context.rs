// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Operation Context
//!
//! Bundles the two cross-cutting parameters every engine operation accepts: a
//! [`CorrelationId`] for tracing and a cooperative cancellation flag. Passing
//! one `&OperationContext` keeps signatures honest without resorting to
//! ambient thread-local state.
//!
//! ## Cancellation semantics
//!
//! The flag is checked at suspension points — before starting a new chunk,
//! before descending into a directory, between repository calls. In-flight
//! chunk writes are allowed to complete so no half-written blob is left
//! behind; the enclosing file operation then fails with
//! [`EngineError::Canceled`] and the file status becomes `Failed`.
//!
//! The flag itself is a plain atomic so the domain stays runtime-agnostic;
//! the bootstrap layer wires OS signals into it.

use crate::error::EngineError;
use crate::value_objects::CorrelationId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between an operation and its owner.
///
/// Cloning shares the underlying flag; cancelling any clone cancels all.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    canceled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Checks whether cancellation has been requested
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Per-operation context: correlation ID plus cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    correlation_id: CorrelationId,
    cancellation: CancellationFlag,
}

impl OperationContext {
    /// Creates a context with a fresh correlation ID and its own flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context for a caller-supplied correlation ID
    pub fn with_correlation_id(correlation_id: CorrelationId) -> Self {
        OperationContext {
            correlation_id,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Creates a context sharing an external cancellation flag
    pub fn with_cancellation(correlation_id: CorrelationId, cancellation: CancellationFlag) -> Self {
        OperationContext {
            correlation_id,
            cancellation,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_canceled()
    }

    /// Returns `Err(Canceled)` once the signal has been observed.
    ///
    /// Call sites place this before each unit of new work; work already in
    /// flight is left to finish.
    pub fn check_canceled(&self) -> Result<(), EngineError> {
        if self.is_canceled() {
            Err(EngineError::canceled(format!(
                "operation {} canceled",
                self.correlation_id
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_across_clones() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_canceled());
        flag.cancel();
        assert!(clone.is_canceled());
    }

    #[test]
    fn test_check_canceled_reports_correlation_id() {
        let ctx = OperationContext::with_correlation_id(CorrelationId::from_caller("op-9"));
        assert!(ctx.check_canceled().is_ok());
        ctx.cancellation().cancel();
        let err = ctx.check_canceled().unwrap_err();
        assert!(err.to_string().contains("op-9"));
    }
}
