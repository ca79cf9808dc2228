// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ChunkVault CLI
//!
//! Entry point: parses arguments, installs the tracing subscriber, loads
//! configuration, wires the engine through the composition root, and runs
//! exactly one command. SIGINT/SIGTERM flip the engine-wide cancellation
//! flag; in-flight chunk writes finish, no new work starts, and the process
//! exits with the matching code.

use chunkvault::infrastructure::config::EngineSettings;
use chunkvault::presentation::cli::{execute, Cli};
use chunkvault::startup::build_engine;
use chunkvault_bootstrap::{ExitCode, ShutdownCoordinator};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "chunkvault=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match EngineSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "configuration error");
            std::process::exit(ExitCode::from_engine_error(&err).as_i32());
        }
    };

    let shutdown = ShutdownCoordinator::new();
    shutdown.listen_for_signals();

    let engine = match build_engine(&settings, shutdown.cancellation_flag()).await {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "startup failed");
            std::process::exit(ExitCode::from_engine_error(&err).as_i32());
        }
    };

    let exit = match execute(cli.command, &engine.dispatcher).await {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            error!(error = %err, category = err.category(), "command failed");
            eprintln!("error: {}", err);
            ExitCode::from_engine_error(&err)
        }
    };
    std::process::exit(exit.as_i32());
}
