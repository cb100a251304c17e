// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use lms_core::{AuthResult, ClientMeta, Permission, PermissionSet, SessionId, UserId, UserRole};

use super::Claims;

/// Authenticated caller of a request.
///
/// Built by the auth middleware from a validated access token and stored in
/// the request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// User ID.
    pub user_id: UserId,
    /// Session the access token belongs to.
    pub session_id: SessionId,
    /// Role at token issuance.
    pub role: UserRole,
    /// Permissions at token issuance.
    pub permissions: Arc<PermissionSet>,
    /// Access token expiry (Unix seconds).
    pub expires_at: i64,
    /// Access token ID.
    pub token_id: String,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Client user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates a context from validated claims.
    pub fn from_claims(claims: Claims) -> AuthResult<Self> {
        Ok(Self {
            user_id: claims.user_id()?,
            session_id: claims.session_id()?,
            role: claims.role,
            permissions: Arc::new(claims.permissions),
            expires_at: claims.exp,
            token_id: claims.jti,
            client_ip: None,
            user_agent: None,
            request_id: Uuid::now_v7(),
        })
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if the context has all of the given permissions.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_all(permissions)
    }

    /// Returns `true` if the context has any of the given permissions.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_any(permissions)
    }

    /// Returns `true` if this context has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.has_permission(Permission::SystemAdmin) || self.role.is_admin()
    }

    /// Returns the client metadata of the request.
    pub fn client(&self) -> ClientMeta {
        ClientMeta::new(self.client_ip, self.user_agent.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn claims(role: UserRole, permissions: &[Permission]) -> Claims {
        Claims::new(
            UserId::new(),
            role,
            PermissionSet::from_permissions(permissions.iter().copied()),
            SessionId::new(),
            Utc::now(),
            Duration::from_secs(900),
        )
    }

    #[test]
    fn test_context_from_claims() {
        let c = claims(UserRole::Instructor, &[Permission::CourseRead, Permission::GradeWrite]);
        let ctx = AuthContext::from_claims(c.clone()).unwrap();

        assert_eq!(ctx.user_id.to_string(), c.sub);
        assert_eq!(ctx.session_id.to_string(), c.sid);
        assert_eq!(ctx.expires_at, c.exp);
        assert!(ctx.has_permission(Permission::GradeWrite));
        assert!(ctx.has_all_permissions(&[Permission::CourseRead, Permission::GradeWrite]));
        assert!(!ctx.has_any_permission(&[Permission::SessionAdmin, Permission::SystemAdmin]));
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_admin_context() {
        let ctx = AuthContext::from_claims(claims(UserRole::SystemAdmin, &[])).unwrap();
        assert!(ctx.is_admin());
    }

    #[test]
    fn test_malformed_subject_rejected() {
        let mut c = claims(UserRole::Student, &[]);
        c.sub = "someone".to_string();
        assert!(AuthContext::from_claims(c).is_err());
    }

    #[test]
    fn test_client_meta() {
        let ip: IpAddr = "10.0.0.7".parse().unwrap();
        let ctx = AuthContext::from_claims(claims(UserRole::Student, &[]))
            .unwrap()
            .with_client_ip(Some(ip))
            .with_user_agent(Some("curl/8".to_string()));

        let client = ctx.client();
        assert_eq!(client.ip, Some(ip));
        assert_eq!(client.user_agent.as_deref(), Some("curl/8"));
    }
}
