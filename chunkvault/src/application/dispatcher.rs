// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command Dispatcher
//!
//! Routes typed commands to their handlers through an ordered middleware
//! chain. The chain is a functional composition built once per command type
//! at startup: middleware sorted ascending by declared order (ties broken
//! alphabetically by name) and folded around the handler, innermost last —
//! `validation(logging(performance(handler)))` with the standard orders
//! 100/200/300.
//!
//! ## Command state machine
//!
//! `Received -> Validating -> Executing -> Completed | Failed`
//!
//! The pipeline logs `Received` on entry and the terminal state on exit; the
//! validation and logging middleware log the intermediate states. On any
//! error the chain unwinds and the error is rethrown to the caller after
//! logging — middleware never swallows.

use crate::application::commands::Command;
use async_trait::async_trait;
use chunkvault_domain::EngineError;
use std::sync::Arc;
use tracing::{debug, error};

/// Terminal stage of a middleware chain.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C) -> Result<C::Output, EngineError>;
}

/// One layer of the chain. A middleware may short-circuit (validation) or
/// wrap the downstream call (logging, timing).
#[async_trait]
pub trait CommandMiddleware<C: Command>: Send + Sync {
    /// Position in the chain; lower runs first
    fn order(&self) -> u32;

    /// Name used for tie-breaking and logs
    fn name(&self) -> &'static str;

    async fn handle(&self, command: C, next: &dyn CommandHandler<C>) -> Result<C::Output, EngineError>;
}

/// Observable lifecycle of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Received,
    Validating,
    Executing,
    Completed,
    Failed,
}

impl CommandState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandState::Received => "received",
            CommandState::Validating => "validating",
            CommandState::Executing => "executing",
            CommandState::Completed => "completed",
            CommandState::Failed => "failed",
        }
    }
}

struct ChainLink<C: Command> {
    middleware: Arc<dyn CommandMiddleware<C>>,
    next: Arc<dyn CommandHandler<C>>,
}

#[async_trait]
impl<C: Command> CommandHandler<C> for ChainLink<C> {
    async fn handle(&self, command: C) -> Result<C::Output, EngineError> {
        self.middleware.handle(command, &*self.next).await
    }
}

/// A handler wrapped in its middleware chain, composed once at startup.
pub struct CommandPipeline<C: Command> {
    chain: Arc<dyn CommandHandler<C>>,
}

impl<C: Command> CommandPipeline<C> {
    /// Composes `middleware` around `handler`.
    ///
    /// Sorting is ascending by `(order, name)`; composition folds from the
    /// highest order inwards so the lowest order ends up outermost.
    pub fn new(handler: Arc<dyn CommandHandler<C>>, mut middleware: Vec<Arc<dyn CommandMiddleware<C>>>) -> Self {
        middleware.sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.name().cmp(b.name())));
        let chain = middleware.into_iter().rev().fold(handler, |next, layer| {
            Arc::new(ChainLink {
                middleware: layer,
                next,
            }) as Arc<dyn CommandHandler<C>>
        });
        CommandPipeline { chain }
    }

    /// Runs one command through the chain.
    pub async fn dispatch(&self, command: C) -> Result<C::Output, EngineError> {
        let name = command.name();
        let correlation_id = command.correlation_id().clone();
        debug!(
            correlation_id = %correlation_id,
            command = name,
            state = CommandState::Received.as_str(),
            "command received"
        );

        match self.chain.handle(command).await {
            Ok(output) => {
                debug!(
                    correlation_id = %correlation_id,
                    command = name,
                    state = CommandState::Completed.as_str(),
                    "command completed"
                );
                Ok(output)
            }
            Err(err) => {
                error!(
                    correlation_id = %correlation_id,
                    command = name,
                    state = CommandState::Failed.as_str(),
                    error = %err,
                    "command failed"
                );
                Err(err)
            }
        }
    }
}
