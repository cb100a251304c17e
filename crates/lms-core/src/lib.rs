// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-core
//!
//! Shared types and contracts for the LMS authentication services.
//!
//! - **Types**: `UserId`, `SessionId`, `UserRole`, `ClientMeta`, `UserProfile`
//! - **Permission**: the permission vocabulary and `PermissionSet`
//! - **Refresh**: the opaque `base64(session_id:secret)` refresh token
//! - **Error**: `AuthError` and its wire discriminant
//! - **Secure**: constant-time comparison of secrets
//! - **Service**: the identity, session and authorization collaborator traits
//! - **Audit**: audit log entries and sinks
//!
//! ## Example
//!
//! ```
//! use lms_core::refresh::RefreshToken;
//! use lms_core::types::SessionId;
//!
//! let token = RefreshToken::new(SessionId::new(), "secret");
//! let decoded = RefreshToken::decode(&token.encode()).unwrap();
//! assert_eq!(decoded.session_id, token.session_id);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod permission;
pub mod refresh;
pub mod secure;
pub mod types;

// =============================================================================
// Contracts
// =============================================================================

pub mod service;

// =============================================================================
// Audit
// =============================================================================

pub mod audit;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use permission::{Permission, PermissionSet};
pub use refresh::RefreshToken;
pub use service::{AuthorizationService, IdentityService, SessionService};
pub use types::{
    normalize_email, ClientMeta, Credential, IssuedSession, NewUser, SessionId, SessionInfo,
    UserId, UserProfile, UserRole,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
