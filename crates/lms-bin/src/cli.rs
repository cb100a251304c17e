// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the service (default)
//! - `validate`: Validate a configuration file
//! - `version`: Show version information
//! - `hash-password`: Produce an argon2 hash for `bootstrap_users`
//! - `gen-secret`: Generate a random signing secret or internal key

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// LMS authentication service.
///
/// Issues short-lived access tokens and rotating refresh tokens for the
/// learning platform, and hosts the identity, session and authorization
/// collaborators either in one process or split across several.
#[derive(Parser, Debug)]
#[command(
    name = "lms-auth",
    author = "Sylvex",
    version = lms_core::VERSION,
    about = "LMS authentication service",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "lms-auth.yaml",
        env = "LMS_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the service
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration without starting anything.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,

    /// Hash a password for use in `bootstrap_users`
    #[command(name = "hash-password")]
    HashPassword(HashPasswordArgs),

    /// Generate a random secret
    ///
    /// Suitable for `token.secret` and `security.internal_api_key`.
    #[command(name = "gen-secret")]
    GenSecret(GenSecretArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the hosted collaborators (all, coordinator, identity, session, authz)
    #[arg(long, env = "LMS_SERVICE_ROLE")]
    pub role: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Print the parsed configuration (secrets redacted)
    #[arg(short, long)]
    pub show_config: bool,
}

/// Arguments for the `hash-password` command.
#[derive(Args, Debug, Clone)]
pub struct HashPasswordArgs {
    /// Password to hash
    #[arg(required_unless_present = "stdin")]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for the `gen-secret` command.
#[derive(Args, Debug, Clone)]
pub struct GenSecretArgs {
    /// Number of random bytes
    #[arg(short, long, default_value = "48")]
    pub bytes: usize,

    /// Output encoding
    #[arg(short, long, default_value = "base64")]
    pub format: SecretFormat,
}

impl Default for GenSecretArgs {
    fn default() -> Self {
        Self {
            bytes: 48,
            format: SecretFormat::Base64,
        }
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<lms_config::LogFormat> for LogFormat {
    fn from(format: lms_config::LogFormat) -> Self {
        match format {
            lms_config::LogFormat::Text => LogFormat::Text,
            lms_config::LogFormat::Compact => LogFormat::Compact,
            lms_config::LogFormat::Json => LogFormat::Json,
        }
    }
}

/// Secret output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SecretFormat {
    /// URL-safe base64 without padding
    #[default]
    Base64,
    /// Lowercase hexadecimal
    Hex,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Resolves the log level from the flags, falling back to `configured`.
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(configured)
        }
    }

    /// Resolves the log format from the flags, falling back to `configured`.
    pub fn effective_log_format(&self, configured: lms_config::LogFormat) -> LogFormat {
        self.log_format.unwrap_or_else(|| configured.into())
    }
}

// =============================================================================
// Tests
// =============================================================================
