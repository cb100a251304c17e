// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access token claims.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lms_core::{AuthError, AuthResult, Permission, PermissionSet, SessionId, UserId, UserRole};

/// Claims carried by an access token.
///
/// The session id is always present so that logout can locate the session
/// from the access token alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Registered Claims (RFC 7519)
    // =========================================================================
    /// Subject: the user ID.
    pub sub: String,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: String,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Not before (Unix seconds).
    pub nbf: i64,

    /// Expiration (Unix seconds). The token is rejected from this instant on.
    pub exp: i64,

    /// Token ID.
    pub jti: String,

    // =========================================================================
    // Private Claims
    // =========================================================================
    /// Role at issuance.
    pub role: UserRole,

    /// Permissions resolved at issuance.
    #[serde(default)]
    pub permissions: PermissionSet,

    /// Session the token belongs to.
    pub sid: String,
}

impl Claims {
    /// Creates claims issued at `issued_at` and valid for `ttl`.
    pub fn new(
        user_id: UserId,
        role: UserRole,
        permissions: PermissionSet,
        session_id: SessionId,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            iss: String::new(),
            aud: String::new(),
            iat,
            nbf: iat,
            exp: iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            jti: Uuid::now_v7().to_string(),
            role,
            permissions,
            sid: session_id.to_string(),
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = issuer.into();
        self
    }

    /// Sets the audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.aud = audience.into();
        self
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub
            .parse()
            .map_err(|_| AuthError::invalid_token("malformed subject"))
    }

    /// Returns the session ID.
    pub fn session_id(&self) -> AuthResult<SessionId> {
        self.sid
            .parse()
            .map_err(|_| AuthError::invalid_token("malformed session id"))
    }

    /// Returns `true` if the claims grant the given permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if the token is expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Returns the expiration time.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued-at time.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Returns the time remaining until expiration.
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::from_secs((self.exp - now) as u64))
        } else {
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(ttl: Duration) -> Claims {
        Claims::new(
            UserId::new(),
            UserRole::Instructor,
            PermissionSet::from_permissions([Permission::CourseRead, Permission::GradeWrite]),
            SessionId::new(),
            Utc::now(),
            ttl,
        )
    }

    #[test]
    fn test_claims_creation() {
        let c = claims(Duration::from_secs(900)).with_issuer("lms-auth");

        assert_eq!(c.exp - c.iat, 900);
        assert_eq!(c.nbf, c.iat);
        assert_eq!(c.iss, "lms-auth");
        assert!(c.has_permission(Permission::GradeWrite));
        assert!(!c.has_permission(Permission::SystemAdmin));
        assert!(c.user_id().is_ok());
        assert!(c.session_id().is_ok());
        assert!(!c.is_expired());
    }

    #[test]
    fn test_expiry_boundary() {
        let c = claims(Duration::from_secs(60));

        assert!(!c.is_expired_at(c.exp - 1));
        assert!(c.is_expired_at(c.exp));
        assert!(c.is_expired_at(c.exp + 1));
    }

    #[test]
    fn test_malformed_ids() {
        let mut c = claims(Duration::from_secs(60));
        c.sid = "not-a-session".to_string();
        assert!(matches!(c.session_id(), Err(AuthError::InvalidToken { .. })));
    }

    #[test]
    fn test_serialized_claim_names() {
        let c = claims(Duration::from_secs(60));
        let value = serde_json::to_value(&c).unwrap();

        for key in ["sub", "iss", "aud", "iat", "nbf", "exp", "jti", "role", "permissions", "sid"] {
            assert!(value.get(key).is_some(), "missing claim {}", key);
        }
        assert_eq!(value["role"], "instructor");
    }
}
