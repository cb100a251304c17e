// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-rpc
//!
//! Internal transport between the authentication coordinator and its
//! collaborators.
//!
//! - **Server**: axum routes exposing any `IdentityService`, `SessionService`
//!   or `AuthorizationService` under `/internal`
//! - **Client**: reqwest implementations of the same traits
//! - **Wire**: request, response and error bodies shared by both sides
//!
//! ## Example
//!
//! ```no_run
//! use lms_rpc::{HttpSessionClient, RpcClientConfig};
//!
//! let sessions = HttpSessionClient::new(
//!     &RpcClientConfig::new("http://session:8082").with_api_key("shared-key"),
//! ).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod server;
pub mod wire;

pub use client::{HttpAuthzClient, HttpIdentityClient, HttpSessionClient, RpcClientConfig};
pub use server::{authz_routes, identity_routes, session_routes, InternalRouter, RpcError};
pub use wire::{ErrorBody, INTERNAL_KEY_HEADER};
