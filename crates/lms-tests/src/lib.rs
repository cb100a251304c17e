// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # LMS Authentication Integration Tests
//!
//! Shared test utilities and cross-crate integration suites.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Accounts, secrets and configuration snippets
//!   - `mocks`: Collaborators with failure injection and call counters
//!   - `harness`: A coordinator wired to mocks, plus an HTTP driver
//!   - `assertions`: Error-kind assertions
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lms-tests
//! cargo test -p lms-tests --test integration_flow
//! cargo test -p lms-tests --test integration_http
//! cargo test -p lms-tests --test integration_split
//! cargo test -p lms-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Flow Tests (`integration_flow.rs`)
//! - Token claims match the resolved role and permissions
//! - Rotated refresh tokens are rejected
//! - Logout ends refresh
//! - Access tokens expire exactly at `exp`
//! - Concurrent refresh with one token
//! - Compensation after partial login failure
//!
//! ### HTTP Tests (`integration_http.rs`)
//! - Collaborator failures surfaced through the public API
//! - Readiness reporting
//!
//! ### Split Deployment Tests (`integration_split.rs`)
//! - Coordinator talking to collaborators over real sockets
//!
//! ### Config Tests (`integration_config.rs`)
//! - Config file to running router, bootstrap accounts included
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use lms_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let harness = AuthHarness::new().await;
//!     harness.authz.fail_resolve.set(true);
//!     let err = harness.login_as(&STUDENT).await.unwrap_err();
//!     assert_kind(&err, AuthErrorKind::PermissionResolutionFailure);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::init_test_logging;
    pub use lms_core::AuthErrorKind;
}
