// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `lms-auth` command.
//!
//! One binary runs every deployment shape: the whole stack in one process,
//! or a single collaborator (`identity`, `session`, `authz`) or the
//! `coordinator` per process. [`runtime::AuthRuntime`] does the wiring,
//! [`cli`] and [`commands`] the argument handling.
//!
//! ```bash
//! lms-auth -c /etc/lms/auth.yaml            # all-in-one, `run` is implied
//! lms-auth run --role session --port 8101
//! lms-auth validate --show-config
//! lms-auth hash-password --stdin < password.txt
//! lms-auth gen-secret -f hex
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{AuthRuntime, Components};
pub use shutdown::ShutdownCoordinator;

/// Version reported by `lms-auth version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
