// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Common Test Utilities
//!
//! - `fixtures`: Pre-built accounts and configuration
//! - `mocks`: Mock collaborators
//! - `harness`: Coordinator and router under test
//! - `assertions`: Assertion helpers

pub mod assertions;
pub mod fixtures;
pub mod harness;
pub mod mocks;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize test logging. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn,lms=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}
