// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Failures of the `lms-auth` binary and how they map to exit codes.

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for the binary.
pub type BinResult<T> = Result<T, BinError>;

// sysexits(3) codes
const EX_USAGE: u8 = 64;
const EX_UNAVAILABLE: u8 = 69;
const EX_SOFTWARE: u8 = 70;
const EX_IOERR: u8 = 74;
const EX_CONFIG: u8 = 78;

/// Why the binary gave up.
#[derive(Debug, Error)]
pub enum BinError {
    /// A setting or argument is unusable.
    #[error("invalid configuration: {0}")]
    BadConfig(String),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] lms_config::ConfigError),

    /// A component could not be started.
    #[error("startup failed: {0}")]
    Startup(String),

    /// The service stopped abnormally.
    #[error("service stopped: {0}")]
    Stopped(String),

    /// Terminal or socket I/O failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The public server failed.
    #[error(transparent)]
    Api(#[from] lms_api::ApiError),

    /// An authentication component failed.
    #[error(transparent)]
    Auth(#[from] lms_core::AuthError),

    /// Wraps another error with what was being done.
    #[error("{context}")]
    Context {
        /// What was being done.
        context: String,
        /// The failure.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Unusable setting or argument.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::BadConfig(msg.into())
    }

    /// Component start failure.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Abnormal stop.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Stopped(msg.into())
    }

    /// Records what was being done when `self` happened.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Process exit code, following sysexits(3).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Context { source, .. } => source.exit_code(),
            Self::BadConfig(_) => EX_USAGE,
            Self::Config(_) => EX_CONFIG,
            Self::Startup(_) | Self::Api(_) => EX_UNAVAILABLE,
            Self::Io(_) => EX_IOERR,
            Self::Stopped(_) | Self::Auth(_) => EX_SOFTWARE,
        }
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Stopped(format!("{err:#}"))
    }
}

/// Prints `error` with its causes to stderr and returns the exit code.
pub fn report(error: &BinError) -> ExitCode {
    let mut message = format!("error: {error}");
    let mut cause = std::error::Error::source(error);
    while let Some(err) = cause {
        message.push_str(&format!("\n  caused by: {err}"));
        cause = err.source();
    }
    eprintln!("{message}");
    ExitCode::from(error.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_inner_code() {
        let err = BinError::config("token.secret missing").with_context("loading lms-auth.yaml");
        assert_eq!(err.to_string(), "loading lms-auth.yaml");
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("invalid configuration: token.secret missing".to_string())
        );
        assert_eq!(err.exit_code(), EX_USAGE);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::init("bind").exit_code(), EX_UNAVAILABLE);
        assert_eq!(BinError::runtime("panic").exit_code(), EX_SOFTWARE);
        assert_eq!(BinError::from(io::Error::other("x")).exit_code(), EX_IOERR);
        assert_eq!(
            BinError::from(lms_config::ConfigError::file_not_found("/x.yaml")).exit_code(),
            EX_CONFIG
        );
        assert_eq!(
            BinError::from(anyhow::anyhow!("stdin closed")).to_string(),
            "service stopped: stdin closed"
        );
    }
}
