// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Collaborators wrapping the real in-memory stores, with per-operation
//! failure injection and call counters.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use lms_authz::PolicyResolver;
use lms_core::audit::{AuditError, AuditFilter, AuditLog, AuditLogger, AuditResult};
use lms_core::{
    AuthError, AuthResult, AuthorizationService, ClientMeta, IdentityService, IssuedSession,
    NewUser, PermissionSet, SessionId, SessionInfo, SessionService, UserId, UserProfile, UserRole,
};
use lms_identity::InMemoryIdentityStore;
use lms_session::{InMemorySessionStore, SessionStoreConfig};

/// A switch that makes an operation fail.
#[derive(Debug, Default)]
pub struct FailureSwitch {
    always: AtomicBool,
    next: AtomicBool,
}

impl FailureSwitch {
    /// Fails every call while `enabled`.
    pub fn set(&self, enabled: bool) {
        self.always.store(enabled, Ordering::SeqCst);
    }

    /// Fails the next call only.
    pub fn once(&self) {
        self.next.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if this call should fail.
    pub fn trip(&self) -> bool {
        self.always.load(Ordering::SeqCst) || self.next.swap(false, Ordering::SeqCst)
    }
}

fn unavailable(service: &str) -> AuthError {
    AuthError::upstream(service, "injected failure")
}

// =============================================================================
// Mock Identity Service
// =============================================================================

/// Identity service with failure injection.
#[derive(Default)]
pub struct MockIdentityService {
    inner: InMemoryIdentityStore,

    /// Fails `validate_credentials`.
    pub fail_validate: FailureSwitch,
    /// Fails `get_profile`.
    pub fail_get_profile: FailureSwitch,
    /// Fails `update_password`.
    pub fail_update_password: FailureSwitch,

    healthy: AtomicBool,
    validate_calls: AtomicUsize,
    get_profile_calls: AtomicUsize,
}

impl MockIdentityService {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &InMemoryIdentityStore {
        &self.inner
    }

    /// Sets the health probe result.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of `validate_credentials` calls.
    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_profile` calls.
    pub fn get_profile_calls(&self) -> usize {
        self.get_profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn validate_credentials(&self, email: &str, password: &str) -> AuthResult<UserProfile> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_validate.trip() {
            return Err(unavailable("identity"));
        }
        self.inner.validate_credentials(email, password).await
    }

    async fn get_profile(&self, user_id: UserId) -> AuthResult<UserProfile> {
        self.get_profile_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_profile.trip() {
            return Err(unavailable("identity"));
        }
        self.inner.get_profile(user_id).await
    }

    async fn update_password(
        &self,
        user_id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> AuthResult<()> {
        if self.fail_update_password.trip() {
            return Err(unavailable("identity"));
        }
        self.inner
            .update_password(user_id, current_password, new_password)
            .await
    }

    async fn register(&self, user: NewUser) -> AuthResult<UserProfile> {
        self.inner.register(user).await
    }

    async fn deactivate(&self, user_id: UserId) -> AuthResult<()> {
        self.inner.deactivate(user_id).await
    }

    fn name(&self) -> &str {
        "mock-identity"
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Mock Session Service
// =============================================================================

/// Session service with failure injection, call counters and latency.
pub struct MockSessionService {
    inner: InMemorySessionStore,

    /// Fails `create_session`.
    pub fail_create: FailureSwitch,
    /// Fails `refresh_session`.
    pub fail_refresh: FailureSwitch,
    /// Fails `revoke_session`.
    pub fail_revoke: FailureSwitch,
    /// Fails `revoke_all_for_user`.
    pub fail_revoke_all: FailureSwitch,

    refresh_delay: Mutex<Duration>,
    create_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
    revoked: Mutex<Vec<SessionId>>,
}

impl MockSessionService {
    /// Creates a mock over a store with `config`.
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            inner: InMemorySessionStore::new(config),
            fail_create: FailureSwitch::default(),
            fail_refresh: FailureSwitch::default(),
            fail_revoke: FailureSwitch::default(),
            fail_revoke_all: FailureSwitch::default(),
            refresh_delay: Mutex::new(Duration::ZERO),
            create_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            revoked: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &InMemorySessionStore {
        &self.inner
    }

    /// Delays every refresh before it reaches the store.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock() = delay;
    }

    /// Number of `create_session` calls.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `refresh_session` calls.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of `revoke_session` calls, failed ones included.
    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    /// Sessions successfully revoked through `revoke_session`.
    pub fn revoked(&self) -> Vec<SessionId> {
        self.revoked.lock().clone()
    }
}

impl Default for MockSessionService {
    fn default() -> Self {
        Self::new(SessionStoreConfig::default())
    }
}

#[async_trait]
impl SessionService for MockSessionService {
    async fn create_session(
        &self,
        user_id: UserId,
        role: UserRole,
        client: ClientMeta,
    ) -> AuthResult<IssuedSession> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.trip() {
            return Err(unavailable("session"));
        }
        self.inner.create_session(user_id, role, client).await
    }

    async fn refresh_session(
        &self,
        session_id: SessionId,
        secret: &str,
    ) -> AuthResult<IssuedSession> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.trip() {
            return Err(unavailable("session"));
        }
        let delay = *self.refresh_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.inner.refresh_session(session_id, secret).await
    }

    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke.trip() {
            return Err(unavailable("session"));
        }
        self.inner.revoke_session(session_id).await?;
        self.revoked.lock().push(session_id);
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<usize> {
        if self.fail_revoke_all.trip() {
            return Err(unavailable("session"));
        }
        self.inner.revoke_all_for_user(user_id).await
    }

    async fn list_sessions(&self, user_id: UserId) -> AuthResult<Vec<SessionInfo>> {
        self.inner.list_sessions(user_id).await
    }

    fn name(&self) -> &str {
        "mock-session"
    }
}

// =============================================================================
// Mock Authorization Service
// =============================================================================

/// Authorization service with failure injection.
#[derive(Default)]
pub struct MockAuthzService {
    inner: PolicyResolver,

    /// Fails `resolve`.
    pub fail_resolve: FailureSwitch,

    resolve_calls: AtomicUsize,
}

impl MockAuthzService {
    /// Creates a mock over the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped resolver.
    pub fn resolver(&self) -> &PolicyResolver {
        &self.inner
    }

    /// Number of `resolve` calls.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationService for MockAuthzService {
    async fn resolve(&self, user_id: UserId, role: UserRole) -> AuthResult<PermissionSet> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_resolve.trip() {
            return Err(AuthError::permission_resolution(
                role.as_str(),
                "injected failure",
            ));
        }
        self.inner.resolve(user_id, role).await
    }

    fn name(&self) -> &str {
        "mock-authz"
    }
}

// =============================================================================
// Failing Audit Logger
// =============================================================================

/// An audit sink whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingAuditLogger {
    attempts: AtomicUsize,
}

impl FailingAuditLogger {
    /// Creates the logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write attempts.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditLogger for FailingAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::write_failed("disk full"))
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "failing"
    }

    async fn health_check(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_switch() {
        let switch = FailureSwitch::default();
        assert!(!switch.trip());

        switch.once();
        assert!(switch.trip());
        assert!(!switch.trip());

        switch.set(true);
        assert!(switch.trip());
        assert!(switch.trip());
        switch.set(false);
        assert!(!switch.trip());
    }

    #[tokio::test]
    async fn test_mock_session_counts_and_fails() {
        let sessions = MockSessionService::default();
        let user = UserId::new();

        sessions.fail_create.once();
        assert!(sessions
            .create_session(user, UserRole::Student, ClientMeta::default())
            .await
            .is_err());
        let issued = sessions
            .create_session(user, UserRole::Student, ClientMeta::default())
            .await
            .unwrap();
        assert_eq!(sessions.create_calls(), 2);

        sessions.revoke_session(issued.session_id).await.unwrap();
        assert_eq!(sessions.revoked(), vec![issued.session_id]);
    }
}
