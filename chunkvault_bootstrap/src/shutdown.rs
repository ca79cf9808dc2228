// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Graceful-shutdown plumbing for the CLI process. OS signals (SIGINT,
//! SIGTERM) flip the engine's [`CancellationFlag`]; in-flight chunk writes
//! finish, no new chunks start, and the process exits with the matching
//! signal code once the current command returns.
//!
//! The coordinator owns the flag and a [`tokio::sync::Notify`] so async
//! callers can `await` the shutdown edge instead of polling.

use chunkvault_domain::CancellationFlag;
use std::sync::Arc;
use tokio::sync::Notify;

/// Default grace period granted to in-flight work after a signal
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Coordinates signal-driven shutdown with the engine's cancellation flag.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    flag: CancellationFlag,
    notify: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        ShutdownCoordinator {
            flag: CancellationFlag::new(),
            notify: Arc::new(Notify::new()),
        }
    }

    /// The cancellation flag handed to operation contexts
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.flag.clone()
    }

    /// Initiates shutdown. Idempotent.
    pub fn initiate(&self) {
        self.flag.cancel();
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.flag.is_canceled()
    }

    /// Waits until shutdown has been initiated
    pub async fn wait(&self) {
        if self.is_shutting_down() {
            return;
        }
        self.notify.notified().await;
    }

    /// Spawns the signal listener wiring SIGINT/SIGTERM into the flag.
    ///
    /// Returns immediately; the listener runs for the life of the process.
    pub fn listen_for_signals(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(stream) => stream,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to install SIGTERM handler");
                        if ctrl_c.await.is_ok() {
                            coordinator.initiate();
                        }
                        return;
                    }
                };
                tokio::select! {
                    _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
                }
            }
            #[cfg(not(unix))]
            {
                let _ = ctrl_c.await;
                tracing::info!("interrupt received, shutting down");
            }
            coordinator.initiate();
        });
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
