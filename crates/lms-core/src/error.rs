// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error kinds shared by every authentication collaborator.
//!
//! The same [`AuthError`] travels through the in-process stores, across the
//! internal HTTP transport (as an [`AuthErrorKind`] plus message) and into the
//! coordinator, which maps it to a public response.
//!
//! # Examples
//!
//! ```
//! use lms_core::error::{AuthError, AuthErrorKind};
//!
//! let error = AuthError::upstream("identity", "connection refused");
//! assert!(error.is_retryable());
//! assert_eq!(error.kind(), AuthErrorKind::UpstreamUnavailable);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// AuthError
// =============================================================================

/// Errors raised by the identity, session, authorization and token components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown email, wrong password, or an inactive account.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The session is unknown, expired, revoked, or the refresh secret is stale.
    #[error("Session expired or revoked")]
    SessionExpiredOrRevoked,

    /// The authorization resolver could not produce a permission set.
    #[error("Permission resolution failed for role '{role}': {reason}")]
    PermissionResolutionFailure {
        /// Role being resolved.
        role: String,
        /// Reason for the failure.
        reason: String,
    },

    /// The access token could not be signed.
    #[error("Token signing failed: {message}")]
    TokenSigningFailure {
        /// Error message.
        message: String,
    },

    /// A collaborator service could not be reached.
    #[error("Upstream service '{service}' unavailable: {message}")]
    UpstreamUnavailable {
        /// Collaborator name (`identity`, `session`, `authz`).
        service: String,
        /// Error message.
        message: String,
    },

    /// A presented token could not be decoded or verified.
    #[error("Invalid token: {reason}")]
    InvalidToken {
        /// Reason for rejection.
        reason: String,
    },

    /// The user does not exist or was soft-deleted.
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// User identifier.
        user_id: String,
    },

    /// The session does not exist.
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// Session identifier.
        session_id: String,
    },

    /// The operation conflicts with existing state.
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl AuthError {
    /// Creates a permission resolution failure.
    pub fn permission_resolution(role: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionResolutionFailure {
            role: role.into(),
            reason: reason.into(),
        }
    }

    /// Creates a token signing failure.
    pub fn token_signing(message: impl Into<String>) -> Self {
        Self::TokenSigningFailure {
            message: message.into(),
        }
    }

    /// Creates an upstream unavailable error.
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid token error.
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Creates a user not found error.
    pub fn user_not_found(user_id: impl ToString) -> Self {
        Self::UserNotFound {
            user_id: user_id.to_string(),
        }
    }

    /// Creates a session not found error.
    pub fn session_not_found(session_id: impl ToString) -> Self {
        Self::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            AuthError::SessionExpiredOrRevoked => AuthErrorKind::SessionExpiredOrRevoked,
            AuthError::PermissionResolutionFailure { .. } => {
                AuthErrorKind::PermissionResolutionFailure
            }
            AuthError::TokenSigningFailure { .. } => AuthErrorKind::TokenSigningFailure,
            AuthError::UpstreamUnavailable { .. } => AuthErrorKind::UpstreamUnavailable,
            AuthError::InvalidToken { .. } => AuthErrorKind::InvalidToken,
            AuthError::UserNotFound { .. } => AuthErrorKind::UserNotFound,
            AuthError::SessionNotFound { .. } => AuthErrorKind::SessionNotFound,
            AuthError::Conflict { .. } => AuthErrorKind::Conflict,
            AuthError::Validation { .. } => AuthErrorKind::Validation,
            AuthError::Internal { .. } => AuthErrorKind::Internal,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::UpstreamUnavailable { .. })
    }

    /// Returns `true` if the caller must authenticate again from scratch.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::SessionExpiredOrRevoked
                | AuthError::InvalidToken { .. }
        )
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Rebuilds an error from its wire kind and message.
    ///
    /// Structured fields that do not travel over the wire are filled from the
    /// message so the reconstructed error stays descriptive.
    pub fn from_wire(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            AuthErrorKind::InvalidCredentials => AuthError::InvalidCredentials,
            AuthErrorKind::SessionExpiredOrRevoked => AuthError::SessionExpiredOrRevoked,
            AuthErrorKind::PermissionResolutionFailure => {
                AuthError::permission_resolution("unknown", message)
            }
            AuthErrorKind::TokenSigningFailure => AuthError::token_signing(message),
            AuthErrorKind::UpstreamUnavailable => AuthError::upstream("remote", message),
            AuthErrorKind::InvalidToken => AuthError::invalid_token(message),
            AuthErrorKind::UserNotFound => AuthError::UserNotFound { user_id: message },
            AuthErrorKind::SessionNotFound => AuthError::SessionNotFound {
                session_id: message,
            },
            AuthErrorKind::Conflict => AuthError::conflict(message),
            AuthErrorKind::Validation => AuthError::validation("request", message),
            AuthErrorKind::Internal => AuthError::internal(message),
        }
    }

    /// Returns the detail that travels with the kind on the wire.
    pub fn wire_message(&self) -> String {
        match self {
            AuthError::UserNotFound { user_id } => user_id.clone(),
            AuthError::SessionNotFound { session_id } => session_id.clone(),
            AuthError::PermissionResolutionFailure { reason, .. } => reason.clone(),
            AuthError::TokenSigningFailure { message }
            | AuthError::UpstreamUnavailable { message, .. }
            | AuthError::Conflict { message }
            | AuthError::Internal { message } => message.clone(),
            AuthError::InvalidToken { reason } => reason.clone(),
            AuthError::Validation { field, message } => format!("{}: {}", field, message),
            other => other.to_string(),
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// AuthErrorKind
// =============================================================================

/// Discriminant of [`AuthError`], used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// See [`AuthError::InvalidCredentials`].
    InvalidCredentials,
    /// See [`AuthError::SessionExpiredOrRevoked`].
    SessionExpiredOrRevoked,
    /// See [`AuthError::PermissionResolutionFailure`].
    PermissionResolutionFailure,
    /// See [`AuthError::TokenSigningFailure`].
    TokenSigningFailure,
    /// See [`AuthError::UpstreamUnavailable`].
    UpstreamUnavailable,
    /// See [`AuthError::InvalidToken`].
    InvalidToken,
    /// See [`AuthError::UserNotFound`].
    UserNotFound,
    /// See [`AuthError::SessionNotFound`].
    SessionNotFound,
    /// See [`AuthError::Conflict`].
    Conflict,
    /// See [`AuthError::Validation`].
    Validation,
    /// See [`AuthError::Internal`].
    Internal,
}

impl AuthErrorKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidCredentials => "invalid_credentials",
            AuthErrorKind::SessionExpiredOrRevoked => "session_expired_or_revoked",
            AuthErrorKind::PermissionResolutionFailure => "permission_resolution_failure",
            AuthErrorKind::TokenSigningFailure => "token_signing_failure",
            AuthErrorKind::UpstreamUnavailable => "upstream_unavailable",
            AuthErrorKind::InvalidToken => "invalid_token",
            AuthErrorKind::UserNotFound => "user_not_found",
            AuthErrorKind::SessionNotFound => "session_not_found",
            AuthErrorKind::Conflict => "conflict",
            AuthErrorKind::Validation => "validation",
            AuthErrorKind::Internal => "internal",
        }
    }

    /// Returns the HTTP status code used for this kind on internal routes.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthErrorKind::InvalidCredentials
            | AuthErrorKind::SessionExpiredOrRevoked
            | AuthErrorKind::InvalidToken => 401,
            AuthErrorKind::UserNotFound | AuthErrorKind::SessionNotFound => 404,
            AuthErrorKind::Conflict => 409,
            AuthErrorKind::Validation => 400,
            AuthErrorKind::UpstreamUnavailable => 503,
            AuthErrorKind::PermissionResolutionFailure
            | AuthErrorKind::TokenSigningFailure
            | AuthErrorKind::Internal => 500,
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(AuthError::upstream("session", "timeout").is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
    }

    #[test]
    fn test_requires_reauthentication() {
        assert!(AuthError::SessionExpiredOrRevoked.requires_reauthentication());
        assert!(AuthError::invalid_token("bad signature").requires_reauthentication());
        assert!(!AuthError::token_signing("key").requires_reauthentication());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::conflict("email taken").status_code(), 409);
        assert_eq!(AuthError::upstream("authz", "down").status_code(), 503);
        assert_eq!(
            AuthError::permission_resolution("student", "empty").status_code(),
            500
        );
    }

    #[test]
    fn test_wire_reconstruction_keeps_kind() {
        let errors = [
            AuthError::InvalidCredentials,
            AuthError::SessionExpiredOrRevoked,
            AuthError::permission_resolution("student", "no policy"),
            AuthError::token_signing("bad key"),
            AuthError::upstream("identity", "refused"),
            AuthError::user_not_found("u-1"),
            AuthError::session_not_found("s-1"),
            AuthError::conflict("duplicate"),
            AuthError::internal("boom"),
        ];

        for error in errors {
            let rebuilt = AuthError::from_wire(error.kind(), error.wire_message());
            assert_eq!(rebuilt.kind(), error.kind());
        }

        let rebuilt = AuthError::from_wire(AuthErrorKind::UserNotFound, "u-1");
        assert_eq!(rebuilt, AuthError::user_not_found("u-1"));
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&AuthErrorKind::SessionExpiredOrRevoked).unwrap();
        assert_eq!(json, "\"session_expired_or_revoked\"");
    }
}
