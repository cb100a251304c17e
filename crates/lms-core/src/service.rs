// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Collaborator contracts used by the authentication coordinator.
//!
//! Each trait is implemented twice: by the in-process store in its own crate
//! and by the HTTP client in `lms-rpc`. The coordinator only ever sees
//! `Arc<dyn ...>`, so the transport is a deployment decision.

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::permission::PermissionSet;
use crate::types::{
    ClientMeta, IssuedSession, NewUser, SessionId, SessionInfo, UserId, UserProfile, UserRole,
};

// =============================================================================
// Identity
// =============================================================================

/// Owns user records and credential hashes.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Verifies an email/password pair and returns the matching profile.
    ///
    /// Unknown email, wrong password and inactive accounts all fail with
    /// `InvalidCredentials`.
    async fn validate_credentials(&self, email: &str, password: &str) -> AuthResult<UserProfile>;

    /// Returns the profile of a user.
    async fn get_profile(&self, user_id: UserId) -> AuthResult<UserProfile>;

    /// Replaces a user's password.
    ///
    /// When `current_password` is given it must match the stored credential.
    async fn update_password(
        &self,
        user_id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> AuthResult<()>;

    /// Registers a new user.
    async fn register(&self, user: NewUser) -> AuthResult<UserProfile>;

    /// Soft-deletes a user. The record is kept but can no longer sign in.
    async fn deactivate(&self, user_id: UserId) -> AuthResult<()>;

    /// Returns the service name for identification.
    fn name(&self) -> &str {
        "identity"
    }

    /// Returns `true` if the service is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Owns the session lifecycle and refresh-token rotation.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Creates a session with a fresh refresh secret.
    async fn create_session(
        &self,
        user_id: UserId,
        role: UserRole,
        client: ClientMeta,
    ) -> AuthResult<IssuedSession>;

    /// Validates a refresh secret and atomically rotates it.
    ///
    /// After a successful call the presented secret is no longer accepted.
    async fn refresh_session(&self, session_id: SessionId, secret: &str)
        -> AuthResult<IssuedSession>;

    /// Revokes a single session. Revoking an already revoked session succeeds.
    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()>;

    /// Revokes every active session of a user and returns how many were revoked.
    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<usize>;

    /// Lists the active sessions of a user.
    async fn list_sessions(&self, user_id: UserId) -> AuthResult<Vec<SessionInfo>>;

    /// Returns the service name for identification.
    fn name(&self) -> &str {
        "session"
    }

    /// Returns `true` if the service is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// Authorization
// =============================================================================

/// Maps a user and role to an effective permission set.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Resolves the permissions of `user_id` acting as `role`.
    async fn resolve(&self, user_id: UserId, role: UserRole) -> AuthResult<PermissionSet>;

    /// Returns the service name for identification.
    fn name(&self) -> &str {
        "authz"
    }

    /// Returns `true` if the service is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}
