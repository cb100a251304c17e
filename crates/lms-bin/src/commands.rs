// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command implementations.

use std::io::{BufRead, Write};

use anyhow::Context;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

use lms_config::{ConfigLoader, LmsConfig};

use crate::cli::{Cli, Commands, GenSecretArgs, HashPasswordArgs, RunArgs, SecretFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::logging::{init_logging, LogOptions};
use crate::runtime::AuthRuntime;

/// Smallest secret `gen-secret` will produce.
pub const MIN_SECRET_BYTES: usize = 32;

/// Dispatches the parsed command line.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run(&cli, args).await,
        Commands::Validate(args) => validate(&cli, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::HashPassword(args) => hash_password(args),
        Commands::GenSecret(args) => gen_secret(args),
    }
}

// =============================================================================
// run
// =============================================================================

async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let mut config = load(cli)?;

    if let Some(role) = &args.role {
        config.service.role = role.parse().map_err(BinError::config)?;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    init_logging(
        cli.effective_log_level(config.logging.level.as_str()),
        cli.effective_log_format(config.logging.format),
        LogOptions::from(&config.logging),
    );

    AuthRuntime::new(config).run().await
}

fn load(cli: &Cli) -> BinResult<LmsConfig> {
    ConfigLoader::new()
        .load(&cli.config)
        .map_err(|e| BinError::from(e).with_context(format!("loading {}", cli.config.display())))
}

// =============================================================================
// validate
// =============================================================================

fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = load(cli)?;

    println!("Configuration is valid: {}", cli.config.display());
    println!("  service:         {} ({})", config.service.name, config.service.role);
    println!("  listen:          {}", config.server.socket_addr());
    println!("  token ttl:       {}s ({})", config.token.ttl_secs, config.token.algorithm);
    println!("  refresh ttl:     {}s", config.session.refresh_ttl_secs);
    println!("  bootstrap users: {}", config.bootstrap_users.len());

    if args.show_config {
        // Debug output keeps secrets redacted.
        println!("\n{config:#?}");
    }

    Ok(())
}

// =============================================================================
// version
// =============================================================================

fn print_version() {
    println!("lms-auth {}", crate::VERSION);
    println!("  lms-core   {}", lms_core::VERSION);
    println!("  lms-api    {}", lms_api::VERSION);
    println!(
        "  target     {}-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    );
}

// =============================================================================
// hash-password
// =============================================================================

fn hash_password(args: HashPasswordArgs) -> BinResult<()> {
    let password = match args.password {
        Some(password) if !args.stdin => password,
        _ => read_stdin_line()?,
    };
    if password.is_empty() {
        return Err(BinError::config("password cannot be empty"));
    }

    let hash = lms_identity::hash_password(&password)?;
    println!("{hash}");
    Ok(())
}

fn read_stdin_line() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// =============================================================================
// gen-secret
// =============================================================================

fn gen_secret(args: GenSecretArgs) -> BinResult<()> {
    let secret = generate_secret(args.bytes, args.format)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{secret}")?;
    Ok(())
}

/// Generates `bytes` random bytes in the requested encoding.
pub fn generate_secret(bytes: usize, format: SecretFormat) -> BinResult<String> {
    if bytes < MIN_SECRET_BYTES {
        return Err(BinError::config(format!(
            "secrets must be at least {MIN_SECRET_BYTES} bytes"
        )));
    }

    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);

    Ok(match format {
        SecretFormat::Base64 => URL_SAFE_NO_PAD.encode(&buf),
        SecretFormat::Hex => hex::encode(&buf),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret() {
        let hex = generate_secret(32, SecretFormat::Hex).unwrap();
        assert_eq!(hex.len(), 64);

        let b64 = generate_secret(48, SecretFormat::Base64).unwrap();
        assert_eq!(b64.len(), 64);
        assert_ne!(b64, generate_secret(48, SecretFormat::Base64).unwrap());

        assert!(generate_secret(8, SecretFormat::Hex).is_err());
    }

    #[tokio::test]
    async fn test_validate_reports_missing_file() {
        use clap::Parser;

        let cli = Cli::parse_from(["lms-auth", "-c", "/nonexistent/lms-auth.yaml", "validate"]);
        let err = execute(cli).await.unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }
}
