// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication coordinator.
//!
//! Sequences the identity, session and authorization collaborators into the
//! login, refresh and logout flows. Permissions are resolved again every time
//! a token is signed; the role stored with a session is only a hint.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use lms_core::audit::{ActionResult, AuditLog, AuditLogger, NoOpAuditLogger};
use lms_core::{
    AuthError, AuthResult, AuthorizationService, ClientMeta, IdentityService, IssuedSession,
    RefreshToken, SessionId, SessionInfo, SessionService, UserId, UserProfile, UserRole,
};

use crate::auth::{AccessToken, TokenIssuer};

// =============================================================================
// TokenPair
// =============================================================================

/// Result of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Signed access token.
    pub access: AccessToken,
    /// Encoded refresh token (`base64(session_id:secret)`).
    pub refresh_token: String,
    /// Session the pair belongs to.
    pub session_id: SessionId,
    /// When the refresh token stops being accepted.
    pub refresh_expires_at: DateTime<Utc>,
}

// =============================================================================
// AuthCoordinator
// =============================================================================

/// Orchestrates authentication flows across the collaborator services.
#[derive(Clone)]
pub struct AuthCoordinator {
    identity: Arc<dyn IdentityService>,
    sessions: Arc<dyn SessionService>,
    authz: Arc<dyn AuthorizationService>,
    issuer: Arc<TokenIssuer>,
    audit: Arc<dyn AuditLogger>,
}

impl AuthCoordinator {
    /// Creates a coordinator.
    pub fn new(
        identity: Arc<dyn IdentityService>,
        sessions: Arc<dyn SessionService>,
        authz: Arc<dyn AuthorizationService>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            identity,
            sessions,
            authz,
            issuer,
            audit: Arc::new(NoOpAuditLogger::new()),
        }
    }

    /// Sets the audit logger.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit = logger;
        self
    }

    /// Returns the token issuer.
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// Returns the audit logger.
    pub fn audit_logger(&self) -> &Arc<dyn AuditLogger> {
        &self.audit
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verifies credentials, opens a session and issues a token pair.
    ///
    /// If anything fails after the session was created, the session is
    /// revoked before the error is returned.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientMeta,
    ) -> AuthResult<TokenPair> {
        let started = Instant::now();

        let profile = match self.identity.validate_credentials(email, password).await {
            Ok(profile) => profile,
            Err(e) => {
                debug!(kind = %e.kind(), "Login rejected by identity service");
                self.record(AuditLog::login_failed(email, &client, e.kind().as_str()))
                    .await;
                return Err(e);
            }
        };

        let issued = match self
            .sessions
            .create_session(profile.id, profile.role, client.clone())
            .await
        {
            Ok(issued) => issued,
            Err(e) => {
                warn!(user_id = %profile.id, error = %e, "Session creation failed");
                self.record(AuditLog::login_failed(email, &client, e.kind().as_str()))
                    .await;
                return Err(e);
            }
        };

        match self.issue(profile.id, profile.role, &issued).await {
            Ok(pair) => {
                info!(
                    user_id = %profile.id,
                    session_id = %issued.session_id,
                    role = %profile.role,
                    "User logged in"
                );
                let elapsed = started.elapsed().as_millis() as u64;
                self.record(
                    AuditLog::login(profile.id, issued.session_id, &client).with_duration(elapsed),
                )
                .await;
                Ok(pair)
            }
            Err(e) => {
                warn!(
                    user_id = %profile.id,
                    session_id = %issued.session_id,
                    error = %e,
                    "Login failed after session creation"
                );
                self.compensate(issued.session_id).await;
                self.record(
                    AuditLog::login_failed(email, &client, e.kind().as_str())
                        .with_session_id(issued.session_id),
                )
                .await;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Rotates a refresh token and issues a new token pair.
    ///
    /// The presented refresh token is spent even if a later step fails.
    pub async fn refresh(&self, encoded: &str) -> AuthResult<TokenPair> {
        let presented = match RefreshToken::decode(encoded) {
            Ok(token) => token,
            Err(e) => {
                self.record(AuditLog::token_refresh_rejected(None, "malformed"))
                    .await;
                return Err(e);
            }
        };
        let session_id = presented.session_id;

        let rotated = match self
            .sessions
            .refresh_session(session_id, &presented.secret)
            .await
        {
            Ok(rotated) => rotated,
            Err(e) => {
                debug!(session_id = %session_id, kind = %e.kind(), "Refresh rejected");
                self.record(AuditLog::token_refresh_rejected(
                    Some(session_id),
                    e.kind().as_str(),
                ))
                .await;
                return Err(e);
            }
        };

        let profile = match self.current_profile(&rotated).await {
            Ok(profile) => profile,
            Err(e) => {
                self.record(AuditLog::token_refresh(
                    rotated.user_id,
                    session_id,
                    ActionResult::rejected(e.kind().as_str()),
                ))
                .await;
                return Err(e);
            }
        };

        if profile.role != rotated.role {
            info!(
                user_id = %profile.id,
                session_role = %rotated.role,
                current_role = %profile.role,
                "Role changed since session creation"
            );
        }

        match self.issue(profile.id, profile.role, &rotated).await {
            Ok(pair) => {
                debug!(user_id = %profile.id, session_id = %session_id, "Session refreshed");
                self.record(AuditLog::token_refresh(
                    profile.id,
                    session_id,
                    ActionResult::Success,
                ))
                .await;
                Ok(pair)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Refresh failed after rotation");
                self.record(AuditLog::token_refresh(
                    profile.id,
                    session_id,
                    ActionResult::failure(e.kind().as_str()),
                ))
                .await;
                Err(e)
            }
        }
    }

    /// Loads the current profile of a session owner.
    ///
    /// A missing or inactive user ends the session.
    async fn current_profile(&self, session: &IssuedSession) -> AuthResult<UserProfile> {
        match self.identity.get_profile(session.user_id).await {
            Ok(profile) if profile.active => Ok(profile),
            Ok(_) | Err(AuthError::UserNotFound { .. }) => {
                info!(
                    user_id = %session.user_id,
                    session_id = %session.session_id,
                    "Session owner can no longer sign in, revoking session"
                );
                self.compensate(session.session_id).await;
                Err(AuthError::SessionExpiredOrRevoked)
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Revokes the session of an access token.
    ///
    /// Logout is advisory: every failure is logged and swallowed. The token
    /// signature must be valid but an expired token is accepted.
    pub async fn logout(&self, access_token: &str) {
        let claims = match self.issuer.verify_signature(access_token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Logout with unverifiable token ignored");
                return;
            }
        };
        let session_id = match claims.session_id() {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "Logout token carries no usable session id");
                return;
            }
        };

        match self.sessions.revoke_session(session_id).await {
            Ok(()) => {
                info!(user_id = %claims.sub, session_id = %session_id, "User logged out");
                self.record(AuditLog::logout(&claims.sub, session_id, ActionResult::Success))
                    .await;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Logout could not revoke session");
                self.record(AuditLog::logout(
                    &claims.sub,
                    session_id,
                    ActionResult::failure(e.kind().as_str()),
                ))
                .await;
            }
        }
    }

    /// Revokes every session of the calling user.
    pub async fn logout_all(&self, user_id: UserId) -> AuthResult<usize> {
        let revoked = self.sessions.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "All sessions revoked");
        self.record(AuditLog::sessions_revoked(user_id, user_id, revoked))
            .await;
        Ok(revoked)
    }

    /// Revokes every session of another user on behalf of `actor`.
    pub async fn revoke_user_sessions(&self, actor: UserId, target: UserId) -> AuthResult<usize> {
        let revoked = self.sessions.revoke_all_for_user(target).await?;
        info!(actor = %actor, target = %target, revoked, "User sessions revoked by administrator");
        self.record(AuditLog::sessions_revoked(actor, target, revoked))
            .await;
        Ok(revoked)
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Changes a password and revokes every session of the user.
    ///
    /// Returns the number of sessions revoked.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<Option<usize>> {
        if let Err(e) = self
            .identity
            .update_password(user_id, Some(current_password), new_password)
            .await
        {
            self.record(AuditLog::password_change(
                user_id,
                ActionResult::failure(e.kind().as_str()),
            ))
            .await;
            return Err(e);
        }

        let revoked = self.revoke_after_password_change(user_id).await;
        self.record(
            AuditLog::password_change(user_id, ActionResult::Success)
                .with_details(serde_json::json!({ "revoked": revoked })),
        )
        .await;

        info!(user_id = %user_id, ?revoked, "Password changed");
        Ok(revoked)
    }

    /// The password is already changed when this runs, so a failing session
    /// store only costs the count. One retry, then `None`.
    async fn revoke_after_password_change(&self, user_id: UserId) -> Option<usize> {
        let mut last_error = None;
        for attempt in 1..=2 {
            match self.sessions.revoke_all_for_user(user_id).await {
                Ok(count) => return Some(count),
                Err(e) => {
                    warn!(user_id = %user_id, attempt, error = %e, "Session revocation after password change failed");
                    last_error = Some(e);
                }
            }
        }
        if let Some(e) = last_error {
            error!(user_id = %user_id, error = %e, "Sessions of user remain active after password change");
        }
        None
    }

    /// Lists the active sessions of a user.
    pub async fn sessions(&self, user_id: UserId) -> AuthResult<Vec<SessionInfo>> {
        self.sessions.list_sessions(user_id).await
    }

    /// Revokes one of the caller's own sessions.
    pub async fn revoke_own_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> AuthResult<()> {
        let owned = self
            .sessions
            .list_sessions(user_id)
            .await?
            .iter()
            .any(|s| s.session_id == session_id);
        if !owned {
            return Err(AuthError::session_not_found(session_id));
        }

        self.sessions.revoke_session(session_id).await?;
        self.record(AuditLog::logout(user_id, session_id, ActionResult::Success))
            .await;
        Ok(())
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Probes every collaborator and the audit sink.
    pub async fn health(&self) -> Vec<(String, bool)> {
        let (identity, sessions, authz, audit) = tokio::join!(
            self.identity.health_check(),
            self.sessions.health_check(),
            self.authz.health_check(),
            self.audit.health_check(),
        );
        vec![
            (self.identity.name().to_string(), identity),
            (self.sessions.name().to_string(), sessions),
            (self.authz.name().to_string(), authz),
            (format!("audit:{}", self.audit.name()), audit),
        ]
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn issue(
        &self,
        user_id: UserId,
        role: UserRole,
        session: &IssuedSession,
    ) -> AuthResult<TokenPair> {
        let permissions = self.authz.resolve(user_id, role).await?;
        let access = self
            .issuer
            .sign(user_id, role, permissions, session.session_id)?;
        let refresh_token =
            RefreshToken::new(session.session_id, session.refresh_secret.clone()).encode();

        Ok(TokenPair {
            access,
            refresh_token,
            session_id: session.session_id,
            refresh_expires_at: session.expires_at,
        })
    }

    async fn compensate(&self, session_id: SessionId) {
        if let Err(e) = self.sessions.revoke_session(session_id).await {
            warn!(session_id = %session_id, error = %e, "Compensating session revoke failed");
        }
    }

    async fn record(&self, entry: AuditLog) {
        if let Err(e) = self.audit.log(entry).await {
            warn!(error = %e, "Failed to write audit log");
        }
    }
}

impl std::fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCoordinator")
            .field("identity", &self.identity.name())
            .field("sessions", &self.sessions.name())
            .field("authz", &self.authz.name())
            .field("issuer", &self.issuer)
            .finish()
    }
}
