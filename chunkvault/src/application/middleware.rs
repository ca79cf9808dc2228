// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Standard Middleware
//!
//! The three layers every command pipeline is built with, in their fixed
//! ascending order:
//!
//! | Order | Middleware   | Responsibility |
//! |-------|--------------|----------------|
//! | 100   | validation   | run [`Command::validate`]; short-circuit with `ValidationError` before any I/O |
//! | 200   | logging      | start/end records with duration and correlation ID |
//! | 300   | performance  | time the downstream chain; warn above the slow threshold |
//!
//! All three are generic over the command type, so one instance serves every
//! pipeline that registers it.

use crate::application::commands::Command;
use crate::application::dispatcher::{CommandHandler, CommandMiddleware, CommandState};
use async_trait::async_trait;
use chunkvault_domain::EngineError;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Order 100: declarative input validation.
pub struct ValidationMiddleware;

#[async_trait]
impl<C: Command> CommandMiddleware<C> for ValidationMiddleware {
    fn order(&self) -> u32 {
        100
    }

    fn name(&self) -> &'static str {
        "validation"
    }

    async fn handle(&self, command: C, next: &dyn CommandHandler<C>) -> Result<C::Output, EngineError> {
        debug!(
            correlation_id = %command.correlation_id(),
            command = command.name(),
            state = CommandState::Validating.as_str(),
            "validating command"
        );
        command.validate()?;
        next.handle(command).await
    }
}

/// Order 200: structured start/end logging.
pub struct LoggingMiddleware;

#[async_trait]
impl<C: Command> CommandMiddleware<C> for LoggingMiddleware {
    fn order(&self) -> u32 {
        200
    }

    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, command: C, next: &dyn CommandHandler<C>) -> Result<C::Output, EngineError> {
        let name = command.name();
        let correlation_id = command.correlation_id().clone();
        info!(
            correlation_id = %correlation_id,
            command = name,
            state = CommandState::Executing.as_str(),
            "command started"
        );
        let started = Instant::now();
        let result = next.handle(command).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => info!(
                correlation_id = %correlation_id,
                command = name,
                duration_ms = elapsed.as_millis() as u64,
                "command finished"
            ),
            Err(err) => info!(
                correlation_id = %correlation_id,
                command = name,
                duration_ms = elapsed.as_millis() as u64,
                error = %err,
                "command finished with error"
            ),
        }
        result
    }
}

/// Order 300: handler timing with a slow-command warning.
pub struct PerformanceMiddleware {
    threshold: Duration,
}

impl PerformanceMiddleware {
    /// Default slow threshold: 1000 ms
    pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(1000);

    pub fn new() -> Self {
        Self::with_threshold(Self::DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: Duration) -> Self {
        PerformanceMiddleware { threshold }
    }
}

impl Default for PerformanceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Command> CommandMiddleware<C> for PerformanceMiddleware {
    fn order(&self) -> u32 {
        300
    }

    fn name(&self) -> &'static str {
        "performance"
    }

    async fn handle(&self, command: C, next: &dyn CommandHandler<C>) -> Result<C::Output, EngineError> {
        let name = command.name();
        let correlation_id = command.correlation_id().clone();
        let started = Instant::now();
        let result = next.handle(command).await;
        let elapsed = started.elapsed();
        if elapsed > self.threshold {
            warn!(
                correlation_id = %correlation_id,
                command = name,
                duration_ms = elapsed.as_millis() as u64,
                threshold_ms = self.threshold.as_millis() as u64,
                "slow command"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::CommandPipeline;
    use chunkvault_domain::CorrelationId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct NoopCommand {
        correlation_id: CorrelationId,
        valid: bool,
    }

    impl Command for NoopCommand {
        type Output = ();

        fn name(&self) -> &'static str {
            "Noop"
        }

        fn correlation_id(&self) -> &CorrelationId {
            &self.correlation_id
        }

        fn validate(&self) -> Result<(), EngineError> {
            if self.valid {
                Ok(())
            } else {
                Err(EngineError::validation("invalid"))
            }
        }
    }

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandHandler<NoopCommand> for CountingHandler {
        async fn handle(&self, _command: NoopCommand) -> Result<(), EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn pipeline(calls: Arc<AtomicUsize>) -> CommandPipeline<NoopCommand> {
        CommandPipeline::new(
            Arc::new(CountingHandler { calls }),
            vec![
                Arc::new(ValidationMiddleware),
                Arc::new(LoggingMiddleware),
                Arc::new(PerformanceMiddleware::new()),
            ],
        )
    }

    #[tokio::test]
    async fn test_valid_command_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        pipeline(calls.clone())
            .dispatch(NoopCommand {
                correlation_id: CorrelationId::generate(),
                valid: true,
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_short_circuits_before_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = pipeline(calls.clone())
            .dispatch(NoopCommand {
                correlation_id: CorrelationId::generate(),
                valid: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), "validation");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
