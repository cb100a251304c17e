// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-api
//!
//! Public authentication API for the LMS.
//!
//! - **Token issuer**: HMAC-signed access tokens carrying role, permissions
//!   and session id
//! - **Coordinator**: login, refresh and logout flows over the identity,
//!   session and authorization services
//! - **Server**: axum routes, bearer authentication, permission guards and
//!   rate limiting
//!
//! ## Example
//!
//! ```ignore
//! use lms_api::{ApiConfig, ApiServer, AuthCoordinator};
//!
//! let coordinator = AuthCoordinator::new(identity, sessions, authz, issuer);
//! ApiServer::from_parts(ApiConfig::default(), coordinator)
//!     .run_with_shutdown(shutdown_signal())
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{AccessToken, AuthContext, Claims, TokenConfig, TokenIssuer, MIN_SECRET_LEN};
pub use config::{ApiConfig, CorsConfig};
pub use coordinator::{AuthCoordinator, TokenPair};
pub use error::{ApiError, ApiResult};
pub use middleware::{AuthLayer, RateLimitConfig, RateLimitLayer, RbacLayer};
pub use server::ApiServer;
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
