// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Surface
//!
//! clap definitions and output rendering for the command set:
//! `upload`, `list`, `download`, `delete`, `verify`, `seek`. The CLI builds
//! a typed command, hands it to the dispatcher, and prints the result —
//! every other concern lives below the application layer.

use crate::application::commands::{
    DeleteFileCommand, DownloadFileCommand, ListFilesCommand, ScanDirectoryCommand, UploadFileCommand,
    VerifyFileCommand,
};
use crate::application::handlers::EngineDispatcher;
use chunkvault_domain::{DescriptorKind, EngineError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chunkvault")]
#[command(about = "Chunked, content-addressed file storage engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a file into the vault
    Upload {
        /// File to upload
        path: PathBuf,
    },

    /// List stored files and directories
    List,

    /// Download (reassemble) a stored file
    Download {
        /// File ID to download
        id: String,

        /// Output path (defaults to the stored file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a stored file and its chunks
    Delete {
        /// File ID to delete
        id: String,

        /// Fail when the file does not exist
        #[arg(long)]
        strict: bool,
    },

    /// Verify a stored file's integrity
    Verify {
        /// File ID to verify
        id: String,

        /// Read and re-hash every chunk instead of checking metadata only
        #[arg(long)]
        deep: bool,
    },

    /// Discover files by recursive directory scan
    Seek {
        /// Root directory (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Descend into subdirectories
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        recursive: bool,

        /// Upload discovered file contents through the chunk pipeline
        #[arg(long)]
        process_content: bool,

        /// Process file contents in parallel
        #[arg(long)]
        parallel: bool,
    },
}

/// Executes one parsed subcommand against the dispatcher.
pub async fn execute(command: Commands, dispatcher: &EngineDispatcher) -> Result<(), EngineError> {
    match command {
        Commands::Upload { path } => {
            let descriptor = dispatcher.upload(UploadFileCommand::new(path)).await?;
            println!(
                "uploaded {} ({} bytes, {} chunks) -> {}",
                descriptor.name,
                descriptor.size.unwrap_or(0),
                descriptor.chunk_count,
                descriptor.id
            );
        }
        Commands::List => {
            let files = dispatcher.list(ListFilesCommand::new()).await?;
            if files.is_empty() {
                println!("vault is empty");
            }
            for file in files {
                let marker = match file.kind {
                    DescriptorKind::Directory => "d",
                    DescriptorKind::File => "f",
                };
                println!(
                    "{} {} {:>12} {:?} {}",
                    marker,
                    file.id,
                    file.size.map_or("-".to_string(), |s| s.to_string()),
                    file.status,
                    file.full_path
                );
            }
        }
        Commands::Download { id, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.out", id)));
            dispatcher
                .download(DownloadFileCommand::new(id.clone(), output.clone()))
                .await?;
            println!("downloaded {} -> {}", id, output.display());
        }
        Commands::Delete { id, strict } => {
            let mut command = DeleteFileCommand::new(id.clone());
            command.strict = strict;
            dispatcher.delete(command).await?;
            println!("deleted {}", id);
        }
        Commands::Verify { id, deep } => {
            let report = dispatcher.verify(VerifyFileCommand::new(id.clone(), deep)).await?;
            println!(
                "verify {} ({}): {} chunks expected, {} found",
                id,
                if deep { "deep" } else { "shallow" },
                report.chunks_expected,
                report.chunks_found
            );
            if report.is_valid() {
                println!("integrity: OK");
            } else {
                println!(
                    "integrity: FAILED (missing {:?}, duplicate {:?}, mismatched {:?})",
                    report.missing_sequences, report.duplicate_sequences, report.mismatched_sequences
                );
                return report.into_result();
            }
        }
        Commands::Seek {
            path,
            recursive,
            process_content,
            parallel,
        } => {
            let root = path.unwrap_or_else(|| PathBuf::from("."));
            let mut command = ScanDirectoryCommand::new(root, recursive);
            command.process_content = process_content;
            command.parallel = parallel;
            let progress = dispatcher.scan(command).await?;
            println!(
                "scanned {}: {} directories, {} files ({} processed, {} bytes), {} errors",
                progress.root_path,
                progress.directories_seen,
                progress.files_seen,
                progress.files_processed,
                progress.bytes_seen,
                progress.errors.len()
            );
            for error in &progress.errors {
                eprintln!("  {}: {}", error.path, error.message);
            }
        }
    }
    Ok(())
}
