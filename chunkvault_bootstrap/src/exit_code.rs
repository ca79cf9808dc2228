// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Unix exit-code mapping for the CLI. The command surface promises 0 on
//! success and 1 on any unhandled failure; the extended codes follow BSD
//! `sysexits.h` where a more specific cause is known (usage, I/O, config),
//! plus the conventional 128+signal values for interruption.

use chunkvault_domain::EngineError;
use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    #[default]
    Success = 0,

    /// General error (1)
    Error = 1,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format or integrity error (65)
    DataError = 65,

    /// Cannot open input (66)
    NoInput = 66,

    /// Required backing service unavailable (69)
    Unavailable = 69,

    /// Internal software error (70)
    Software = 70,

    /// I/O error (74)
    IoError = 74,

    /// Configuration error (78)
    Config = 78,

    /// Interrupted by signal (SIGINT - Ctrl+C) (130)
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143)
    Terminated = 143,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps an engine error onto the closest exit code
    pub fn from_engine_error(error: &EngineError) -> Self {
        match error {
            EngineError::Validation(_) => ExitCode::UsageError,
            EngineError::NotFound(_) => ExitCode::NoInput,
            EngineError::Integrity(_) | EngineError::Serialization(_) => ExitCode::DataError,
            EngineError::Storage { .. } | EngineError::Database(_) | EngineError::Cache(_) => ExitCode::Unavailable,
            EngineError::Io(_) | EngineError::Timeout(_) => ExitCode::IoError,
            EngineError::Config(_) => ExitCode::Config,
            EngineError::Canceled(_) => ExitCode::Interrupted,
            EngineError::Internal(_) => ExitCode::Software,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }

    /// Human-readable description of the code
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "success",
            ExitCode::Error => "general error",
            ExitCode::UsageError => "command line usage error",
            ExitCode::DataError => "data format or integrity error",
            ExitCode::NoInput => "cannot open input",
            ExitCode::Unavailable => "backing service unavailable",
            ExitCode::Software => "internal software error",
            ExitCode::IoError => "input/output error",
            ExitCode::Config => "configuration error",
            ExitCode::Interrupted => "interrupted by SIGINT",
            ExitCode::Terminated => "terminated by SIGTERM",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_i32(), self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Error.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn test_engine_error_mapping() {
        assert_eq!(
            ExitCode::from_engine_error(&EngineError::validation("bad input")),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_engine_error(&EngineError::integrity("hash mismatch")),
            ExitCode::DataError
        );
        assert_eq!(
            ExitCode::from_engine_error(&EngineError::canceled("sigint")),
            ExitCode::Interrupted
        );
    }

    #[test]
    fn test_is_signal() {
        assert!(ExitCode::Interrupted.is_signal());
        assert!(ExitCode::Terminated.is_signal());
        assert!(!ExitCode::Error.is_signal());
    }

    #[test]
    fn test_display() {
        let shown = format!("{}", ExitCode::Config);
        assert!(shown.contains("78"));
        assert!(shown.contains("configuration"));
    }
}
