// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormat;

// =============================================================================
// Logging Initialization
// =============================================================================

/// Options beyond level and format.
#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    /// Include targets.
    pub with_target: bool,
    /// Include thread IDs.
    pub with_thread_ids: bool,
    /// Include file and line.
    pub with_file: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            with_target: true,
            with_thread_ids: false,
            with_file: false,
        }
    }
}

impl From<&lms_config::LoggingConfig> for LogOptions {
    fn from(config: &lms_config::LoggingConfig) -> Self {
        Self {
            with_target: config.with_target,
            with_thread_ids: config.with_thread_ids,
            with_file: config.with_file,
        }
    }
}

/// Builds the filter. `RUST_LOG` wins over `level` when set.
pub fn build_filter(level: &str) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    for directive in ["hyper=warn", "hyper_util=warn", "reqwest=warn", "tower=warn", "h2=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

/// Initializes the logging subsystem.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging(level: &str, format: LogFormat, options: LogOptions) {
    let filter = build_filter(level);

    match format {
        LogFormat::Text => init_text_logging(filter, options),
        LogFormat::Json => init_json_logging(filter, options),
        LogFormat::Compact => init_compact_logging(filter, options),
    }
}

fn init_text_logging(filter: EnvFilter, options: LogOptions) {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(options.with_target)
                .with_thread_ids(options.with_thread_ids)
                .with_file(options.with_file)
                .with_line_number(options.with_file)
                .with_ansi(is_terminal),
        )
        .try_init();
}

fn init_json_logging(filter: EnvFilter, options: LogOptions) {
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_target(options.with_target)
                .with_thread_ids(options.with_thread_ids)
                .with_file(true)
                .with_line_number(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init();
}

fn init_compact_logging(filter: EnvFilter, options: LogOptions) {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(options.with_thread_ids)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(is_terminal),
        )
        .try_init();
}

// =============================================================================
// Tests
// =============================================================================
