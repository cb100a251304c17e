// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request and response bodies of the internal routes.

use std::fmt;

use serde::{Deserialize, Serialize};

use lms_core::{AuthError, AuthErrorKind, ClientMeta, PermissionSet, SessionId, UserId, UserRole};

/// Header carrying the shared internal key.
pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// `POST /internal/identity/validate`
#[derive(Clone, Serialize, Deserialize)]
pub struct ValidateCredentialsRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl fmt::Debug for ValidateCredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateCredentialsRequest")
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

/// `PUT /internal/identity/users/{id}/password`
#[derive(Clone, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    /// Current password, when the change must be confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    /// New password.
    pub new_password: String,
}

impl fmt::Debug for UpdatePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePasswordRequest").finish_non_exhaustive()
    }
}

/// `POST /internal/sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Owning user.
    pub user_id: UserId,
    /// Role snapshot.
    pub role: UserRole,
    /// Client metadata.
    #[serde(default)]
    pub client: ClientMeta,
}

/// `POST /internal/sessions/refresh`
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshSessionRequest {
    /// Session ID.
    pub session_id: SessionId,
    /// Raw refresh secret.
    pub secret: String,
}

impl fmt::Debug for RefreshSessionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSessionRequest")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// `POST /internal/sessions/revoke-all`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeAllRequest {
    /// User whose sessions are revoked.
    pub user_id: UserId,
}

/// Response of `POST /internal/sessions/revoke-all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeAllResponse {
    /// Number of sessions revoked.
    pub revoked: usize,
}

/// Query of `GET /internal/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsQuery {
    /// Owning user.
    pub user_id: UserId,
}

/// `POST /internal/authz/resolve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// User being resolved.
    pub user_id: UserId,
    /// Role to resolve for.
    pub role: UserRole,
}

/// Response of `POST /internal/authz/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// Effective permissions.
    pub permissions: PermissionSet,
}

/// Error body returned by every internal route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error kind.
    pub kind: AuthErrorKind,
    /// Detail for the kind.
    pub message: String,
}

impl From<&AuthError> for ErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            kind: err.kind(),
            message: err.wire_message(),
        }
    }
}

impl From<ErrorBody> for AuthError {
    fn from(body: ErrorBody) -> Self {
        AuthError::from_wire(body.kind, body.message)
    }
}
