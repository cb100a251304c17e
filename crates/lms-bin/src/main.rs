// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! `lms-auth` entry point.

use std::process::ExitCode;

use lms_bin::{commands, error, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    match commands::execute(Cli::parse_args()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => error::report(&e),
    }
}
