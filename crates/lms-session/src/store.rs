// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory session store.
//!
//! All mutations of a session happen under one table lock, which is the
//! store's transaction boundary. Two concurrent refreshes presenting the same
//! secret therefore serialize: the first rotates, the second sees a stale
//! secret and fails. A stale secret arriving within the reuse grace of the
//! last rotation is the losing side of such a race and leaves the session
//! alive; later it counts as a replay.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lms_core::audit::{AuditLog, AuditLogger, AuditResource, ActionResult, AuditAction};
use lms_core::{
    AuthError, AuthResult, ClientMeta, IssuedSession, SessionId, SessionInfo, SessionService,
    UserId, UserRole,
};

use crate::secret::{digests_match, generate_secret, hash_secret};

// =============================================================================
// Configuration
// =============================================================================

/// Session lifetime settings.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// How long a refresh secret stays valid after it was issued.
    pub refresh_ttl: Duration,
    /// Absolute cap on a session's life measured from creation.
    pub max_lifetime: Option<Duration>,
    /// Revoke the whole session when an already rotated secret is presented.
    pub revoke_on_reuse: bool,
    /// After a rotation, the replaced secret is refused without revoking
    /// the session for this long.
    pub reuse_grace: Duration,
    /// Maximum active sessions per user (0 = unlimited).
    pub max_sessions_per_user: usize,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
            max_lifetime: Some(Duration::from_secs(30 * 24 * 3600)),
            revoke_on_reuse: true,
            reuse_grace: Duration::from_secs(10),
            max_sessions_per_user: 0,
        }
    }
}

impl SessionStoreConfig {
    /// Sets the refresh TTL.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Sets the absolute lifetime cap.
    pub fn with_max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Enables or disables revocation on reuse.
    pub fn with_revoke_on_reuse(mut self, enabled: bool) -> Self {
        self.revoke_on_reuse = enabled;
        self
    }

    /// Sets the grace period for the replaced secret. Zero disables it.
    pub fn with_reuse_grace(mut self, grace: Duration) -> Self {
        self.reuse_grace = grace;
        self
    }

    /// Sets the per-user session cap.
    pub fn with_max_sessions_per_user(mut self, max: usize) -> Self {
        self.max_sessions_per_user = max;
        self
    }
}

// =============================================================================
// Session Record
// =============================================================================

/// Why a session was revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeReason {
    /// The user logged out of this session.
    Logout,
    /// All sessions of the user were revoked.
    RevokeAll,
    /// A rotated refresh secret was presented again.
    TokenReuse,
    /// The per-user session cap evicted this session.
    SessionLimit,
}

/// A stored session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Session ID.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Role when the session was created. A hint only.
    pub role: UserRole,
    /// SHA-256 of the current refresh secret.
    pub refresh_hash: String,
    /// SHA-256 of the secret replaced by the last rotation.
    pub previous_hash: Option<String>,
    /// Client metadata.
    pub client: ClientMeta,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful rotation.
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Expiry of the current refresh secret.
    pub expires_at: DateTime<Utc>,
    /// Revocation time.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Revocation reason.
    pub revoke_reason: Option<RevokeReason>,
    /// Number of successful rotations.
    pub rotations: u64,
}

impl SessionRecord {
    /// Returns `true` if the session was revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Returns `true` if the session expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the session may still be refreshed at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }

    /// Returns the public view.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            user_id: self.user_id,
            role: self.role,
            client: self.client.clone(),
            created_at: self.created_at,
            last_refreshed_at: self.last_refreshed_at,
            expires_at: self.expires_at,
        }
    }

    fn revoke(&mut self, now: DateTime<Utc>, reason: RevokeReason) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.revoked_at = Some(now);
        self.revoke_reason = Some(reason);
        true
    }
}

// =============================================================================
// Session Store
// =============================================================================

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<SessionId, SessionRecord>,
    by_user: HashMap<UserId, Vec<SessionId>>,
}

impl SessionTable {
    fn user_sessions(&self, user_id: UserId) -> impl Iterator<Item = &SessionRecord> {
        self.by_user
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.sessions.get(id))
    }
}

/// Outcome of a refresh attempt computed under the table lock.
enum Rotation {
    Rotated(IssuedSession),
    Rejected { reuse_of: Option<UserId> },
}

/// Session store keeping sessions in memory.
#[derive(Clone)]
pub struct InMemorySessionStore {
    table: Arc<Mutex<SessionTable>>,
    config: SessionStoreConfig,
    audit_logger: Option<Arc<dyn AuditLogger>>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(SessionStoreConfig::default())
    }
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            table: Arc::new(Mutex::new(SessionTable::default())),
            config,
            audit_logger: None,
        }
    }

    /// Records refresh-token reuse to an audit logger.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.table.lock().sessions.len()
    }

    /// Returns `true` if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.table.lock().sessions.is_empty()
    }

    /// Returns a copy of a stored record.
    pub fn get(&self, session_id: SessionId) -> Option<SessionRecord> {
        self.table.lock().sessions.get(&session_id).cloned()
    }

    fn expiry_for(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let sliding = add_duration(now, self.config.refresh_ttl);
        match self.config.max_lifetime {
            Some(max) => sliding.min(add_duration(created_at, max)),
            None => sliding,
        }
    }

    /// Creates a session as of `now`.
    pub fn create_at(
        &self,
        user_id: UserId,
        role: UserRole,
        client: ClientMeta,
        now: DateTime<Utc>,
    ) -> IssuedSession {
        let secret = generate_secret();
        let record = SessionRecord {
            id: SessionId::new(),
            user_id,
            role,
            refresh_hash: hash_secret(&secret),
            previous_hash: None,
            client,
            created_at: now,
            last_refreshed_at: None,
            expires_at: self.expiry_for(now, now),
            revoked_at: None,
            revoke_reason: None,
            rotations: 0,
        };
        let issued = IssuedSession {
            session_id: record.id,
            user_id,
            role,
            refresh_secret: secret,
            expires_at: record.expires_at,
        };

        let mut table = self.table.lock();

        if self.config.max_sessions_per_user > 0 {
            let mut active: Vec<(DateTime<Utc>, SessionId)> = table
                .user_sessions(user_id)
                .filter(|s| s.is_active(now))
                .map(|s| (s.created_at, s.id))
                .collect();
            active.sort();
            let excess = (active.len() + 1).saturating_sub(self.config.max_sessions_per_user);
            for (_, id) in active.into_iter().take(excess) {
                if let Some(evicted) = table.sessions.get_mut(&id) {
                    evicted.revoke(now, RevokeReason::SessionLimit);
                    debug!(session_id = %id, user_id = %user_id, "Session evicted by per-user limit");
                }
            }
        }

        table.by_user.entry(user_id).or_default().push(record.id);
        table.sessions.insert(record.id, record);

        info!(session_id = %issued.session_id, user_id = %user_id, "Session created");
        issued
    }

    fn within_reuse_grace(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        let Ok(grace) = chrono::Duration::from_std(self.config.reuse_grace) else {
            return false;
        };
        record
            .last_refreshed_at
            .is_some_and(|rotated| now < rotated + grace)
    }

    fn rotate_at(&self, session_id: SessionId, secret: &str, now: DateTime<Utc>) -> Rotation {
        let presented = hash_secret(secret);
        let mut table = self.table.lock();

        let Some(record) = table.sessions.get_mut(&session_id) else {
            return Rotation::Rejected { reuse_of: None };
        };

        if record.is_revoked() || record.is_expired(now) {
            debug!(session_id = %session_id, revoked = record.is_revoked(), "Refresh refused for inactive session");
            return Rotation::Rejected { reuse_of: None };
        }

        if !digests_match(&presented, &record.refresh_hash) {
            let is_replay = record
                .previous_hash
                .as_deref()
                .is_some_and(|prev| digests_match(&presented, prev));
            if !is_replay {
                return Rotation::Rejected { reuse_of: None };
            }
            if self.within_reuse_grace(record, now) {
                debug!(session_id = %session_id, "Replaced refresh secret presented during grace period");
                return Rotation::Rejected { reuse_of: None };
            }
            warn!(
                session_id = %session_id,
                user_id = %record.user_id,
                revoke = self.config.revoke_on_reuse,
                "Rotated refresh secret presented again"
            );
            if self.config.revoke_on_reuse {
                record.revoke(now, RevokeReason::TokenReuse);
            }
            return Rotation::Rejected {
                reuse_of: Some(record.user_id),
            };
        }

        let new_secret = generate_secret();
        let old_hash = std::mem::replace(&mut record.refresh_hash, hash_secret(&new_secret));
        record.previous_hash = Some(old_hash);
        record.last_refreshed_at = Some(now);
        record.rotations += 1;
        record.expires_at = self.expiry_for(record.created_at, now);

        Rotation::Rotated(IssuedSession {
            session_id,
            user_id: record.user_id,
            role: record.role,
            refresh_secret: new_secret,
            expires_at: record.expires_at,
        })
    }

    /// Validates and rotates a refresh secret as of `now`.
    pub async fn refresh_at(
        &self,
        session_id: SessionId,
        secret: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedSession> {
        match self.rotate_at(session_id, secret, now) {
            Rotation::Rotated(issued) => {
                debug!(session_id = %session_id, "Refresh secret rotated");
                Ok(issued)
            }
            Rotation::Rejected { reuse_of } => {
                if let (Some(user_id), Some(logger)) = (reuse_of, &self.audit_logger) {
                    let entry = AuditLog::new(
                        AuditAction::TokenReuse,
                        AuditResource::session(session_id),
                        ActionResult::rejected("rotated refresh secret replayed"),
                    )
                    .with_user(user_id)
                    .with_session_id(session_id)
                    .with_details(serde_json::json!({
                        "session_revoked": self.config.revoke_on_reuse,
                    }));
                    if let Err(e) = logger.log(entry).await {
                        warn!(error = %e, "Failed to audit refresh token reuse");
                    }
                }
                Err(AuthError::SessionExpiredOrRevoked)
            }
        }
    }

    /// Revokes a session as of `now` with a reason.
    pub fn revoke_at(
        &self,
        session_id: SessionId,
        reason: RevokeReason,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut table = self.table.lock();
        let record = table
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| AuthError::session_not_found(session_id))?;
        if record.revoke(now, reason) {
            info!(session_id = %session_id, reason = ?reason, "Session revoked");
        }
        Ok(())
    }

    /// Revokes every active session of a user as of `now`.
    pub fn revoke_all_at(&self, user_id: UserId, now: DateTime<Utc>) -> usize {
        let mut table = self.table.lock();
        let ids = table.by_user.get(&user_id).cloned().unwrap_or_default();
        let mut revoked = 0;
        for id in ids {
            if let Some(record) = table.sessions.get_mut(&id) {
                if !record.is_expired(now) && record.revoke(now, RevokeReason::RevokeAll) {
                    revoked += 1;
                }
            }
        }

        info!(user_id = %user_id, revoked, "All sessions revoked");
        revoked
    }

    /// Lists active sessions of a user as of `now`, oldest first.
    pub fn list_at(&self, user_id: UserId, now: DateTime<Utc>) -> Vec<SessionInfo> {
        let table = self.table.lock();
        let mut sessions: Vec<SessionInfo> = table
            .user_sessions(user_id)
            .filter(|s| s.is_active(now))
            .map(SessionRecord::info)
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    /// Drops records whose refresh secret expired before `now`.
    ///
    /// Revoked but unexpired records are kept so a replayed secret is still
    /// recognised until it would have expired anyway.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut table = self.table.lock();
        let expired: Vec<SessionId> = table
            .sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id)
            .collect();

        for id in &expired {
            if let Some(record) = table.sessions.remove(id) {
                if let Some(ids) = table.by_user.get_mut(&record.user_id) {
                    ids.retain(|existing| existing != id);
                    if ids.is_empty() {
                        table.by_user.remove(&record.user_id);
                    }
                }
            }
        }

        if !expired.is_empty() {
            debug!(purged = expired.len(), "Expired sessions purged");
        }
        expired.len()
    }
}

fn add_duration(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl SessionService for InMemorySessionStore {
    async fn create_session(
        &self,
        user_id: UserId,
        role: UserRole,
        client: ClientMeta,
    ) -> AuthResult<IssuedSession> {
        Ok(self.create_at(user_id, role, client, Utc::now()))
    }

    async fn refresh_session(
        &self,
        session_id: SessionId,
        secret: &str,
    ) -> AuthResult<IssuedSession> {
        self.refresh_at(session_id, secret, Utc::now()).await
    }

    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()> {
        self.revoke_at(session_id, RevokeReason::Logout, Utc::now())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<usize> {
        Ok(self.revoke_all_at(user_id, Utc::now()))
    }

    async fn list_sessions(&self, user_id: UserId) -> AuthResult<Vec<SessionInfo>> {
        Ok(self.list_at(user_id, Utc::now()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::audit::InMemoryAuditLogger;

    fn hours(h: i64) -> chrono::Duration {
        chrono::Duration::hours(h)
    }

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(
            SessionStoreConfig::default()
                .with_refresh_ttl(Duration::from_secs(24 * 3600))
                .with_max_lifetime(Some(Duration::from_secs(72 * 3600))),
        )
    }

    #[tokio::test]
    async fn test_create_stores_only_hash() {
        let store = store();
        let issued = store
            .create_session(UserId::new(), UserRole::Student, ClientMeta::default())
            .await
            .unwrap();

        let record = store.get(issued.session_id).unwrap();
        assert_ne!(record.refresh_hash, issued.refresh_secret);
        assert_eq!(record.refresh_hash, hash_secret(&issued.refresh_secret));
        assert_eq!(record.rotations, 0);
    }

    #[tokio::test]
    async fn test_refresh_rotates_secret() {
        let store = store();
        let issued = store
            .create_session(UserId::new(), UserRole::Student, ClientMeta::default())
            .await
            .unwrap();

        let rotated = store
            .refresh_session(issued.session_id, &issued.refresh_secret)
            .await
            .unwrap();
        assert_eq!(rotated.session_id, issued.session_id);
        assert_ne!(rotated.refresh_secret, issued.refresh_secret);

        // The new secret works once more.
        assert!(store
            .refresh_session(issued.session_id, &rotated.refresh_secret)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_stale_secret_fails_and_revokes() {
        let store = store();
        let t0 = Utc::now();
        let issued = store.create_at(UserId::new(), UserRole::Student, ClientMeta::default(), t0);
        let rotated = store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0)
            .await
            .unwrap();

        let err = store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0 + hours(1))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionExpiredOrRevoked);

        let record = store.get(issued.session_id).unwrap();
        assert_eq!(record.revoke_reason, Some(RevokeReason::TokenReuse));
        assert!(store
            .refresh_at(issued.session_id, &rotated.refresh_secret, t0 + hours(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_stale_secret_within_grace_keeps_session() {
        let store = store();
        let t0 = Utc::now();
        let issued = store.create_at(UserId::new(), UserRole::Student, ClientMeta::default(), t0);
        let rotated = store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0)
            .await
            .unwrap();

        let err = store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0 + chrono::Duration::seconds(2))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionExpiredOrRevoked);
        assert!(!store.get(issued.session_id).unwrap().is_revoked());

        assert!(store
            .refresh_at(issued.session_id, &rotated.refresh_secret, t0 + chrono::Duration::seconds(3))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_zero_grace_revokes_immediately() {
        let store = InMemorySessionStore::new(SessionStoreConfig::default().with_reuse_grace(Duration::ZERO));
        let t0 = Utc::now();
        let issued = store.create_at(UserId::new(), UserRole::Student, ClientMeta::default(), t0);
        store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0)
            .await
            .unwrap();

        assert!(store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0)
            .await
            .is_err());
        assert!(store.get(issued.session_id).unwrap().is_revoked());
    }

    #[tokio::test]
    async fn test_stale_secret_without_revoke_on_reuse() {
        let store = InMemorySessionStore::new(
            SessionStoreConfig::default().with_revoke_on_reuse(false),
        );
        let issued = store
            .create_session(UserId::new(), UserRole::Student, ClientMeta::default())
            .await
            .unwrap();
        let rotated = store
            .refresh_session(issued.session_id, &issued.refresh_secret)
            .await
            .unwrap();

        assert!(store
            .refresh_session(issued.session_id, &issued.refresh_secret)
            .await
            .is_err());
        assert!(store
            .refresh_session(issued.session_id, &rotated.refresh_secret)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reuse_is_audited() {
        let audit = InMemoryAuditLogger::new();
        let store = store().with_audit_logger(Arc::new(audit.clone()));
        let t0 = Utc::now();
        let issued = store.create_at(UserId::new(), UserRole::Student, ClientMeta::default(), t0);
        store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0)
            .await
            .unwrap();
        let _ = store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0 + hours(1))
            .await;

        assert_eq!(audit.entries_for_action(AuditAction::TokenReuse).len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_and_wrong_secret() {
        let store = store();
        assert_eq!(
            store
                .refresh_session(SessionId::new(), "anything")
                .await
                .unwrap_err(),
            AuthError::SessionExpiredOrRevoked
        );

        let issued = store
            .create_session(UserId::new(), UserRole::Student, ClientMeta::default())
            .await
            .unwrap();
        assert!(store
            .refresh_session(issued.session_id, "guess")
            .await
            .is_err());
        // A wrong guess does not burn the session.
        assert!(store
            .refresh_session(issued.session_id, &issued.refresh_secret)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expiry_slides_but_is_capped() {
        let store = store();
        let t0 = Utc::now();
        let issued = store.create_at(UserId::new(), UserRole::Student, ClientMeta::default(), t0);
        assert_eq!(issued.expires_at, t0 + hours(24));

        let r1 = store
            .refresh_at(issued.session_id, &issued.refresh_secret, t0 + hours(20))
            .await
            .unwrap();
        assert_eq!(r1.expires_at, t0 + hours(44));

        let r2 = store
            .refresh_at(issued.session_id, &r1.refresh_secret, t0 + hours(40))
            .await
            .unwrap();
        assert_eq!(r2.expires_at, t0 + hours(64));

        let r3 = store
            .refresh_at(issued.session_id, &r2.refresh_secret, t0 + hours(60))
            .await
            .unwrap();
        assert_eq!(r3.expires_at, t0 + hours(72));

        let err = store
            .refresh_at(issued.session_id, &r3.refresh_secret, t0 + hours(72))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionExpiredOrRevoked);
    }

    #[tokio::test]
    async fn test_revoked_session_cannot_refresh() {
        let store = store();
        let issued = store
            .create_session(UserId::new(), UserRole::Student, ClientMeta::default())
            .await
            .unwrap();
        store.revoke_session(issued.session_id).await.unwrap();
        store.revoke_session(issued.session_id).await.unwrap();

        assert!(store
            .refresh_session(issued.session_id, &issued.refresh_secret)
            .await
            .is_err());
        assert!(matches!(
            store.revoke_session(SessionId::new()).await,
            Err(AuthError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let store = store();
        let user = UserId::new();
        let other = UserId::new();
        for _ in 0..3 {
            store
                .create_session(user, UserRole::Student, ClientMeta::default())
                .await
                .unwrap();
        }
        let kept = store
            .create_session(other, UserRole::Student, ClientMeta::default())
            .await
            .unwrap();

        assert_eq!(store.revoke_all_for_user(user).await.unwrap(), 3);
        assert_eq!(store.revoke_all_for_user(user).await.unwrap(), 0);
        assert!(store.list_sessions(user).await.unwrap().is_empty());
        assert_eq!(store.list_sessions(other).await.unwrap()[0].session_id, kept.session_id);
    }

    #[tokio::test]
    async fn test_session_limit_evicts_oldest() {
        let store = InMemorySessionStore::new(
            SessionStoreConfig::default().with_max_sessions_per_user(2),
        );
        let user = UserId::new();
        let t0 = Utc::now();
        let first = store.create_at(user, UserRole::Student, ClientMeta::default(), t0);
        store.create_at(user, UserRole::Student, ClientMeta::default(), t0 + hours(1));
        store.create_at(user, UserRole::Student, ClientMeta::default(), t0 + hours(2));

        let active = store.list_at(user, t0 + hours(3));
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|s| s.session_id != first.session_id));
        assert_eq!(
            store.get(first.session_id).unwrap().revoke_reason,
            Some(RevokeReason::SessionLimit)
        );
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = store();
        let t0 = Utc::now();
        let user = UserId::new();
        store.create_at(user, UserRole::Student, ClientMeta::default(), t0);
        let fresh = store.create_at(user, UserRole::Student, ClientMeta::default(), t0 + hours(20));

        assert_eq!(store.purge_expired(t0 + hours(30)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(fresh.session_id).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_issues_once() {
        let store = store();
        let issued = store
            .create_session(UserId::new(), UserRole::Student, ClientMeta::default())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let secret = issued.refresh_secret.clone();
            let id = issued.session_id;
            handles.push(tokio::spawn(async move {
                store.refresh_session(id, &secret).await
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            if let Ok(rotated) = handle.await.unwrap() {
                winners.push(rotated);
            }
        }
        assert_eq!(winners.len(), 1);

        // The losers must not take the winner's session down with them.
        assert!(!store.get(issued.session_id).unwrap().is_revoked());
        assert!(store
            .refresh_session(issued.session_id, &winners[0].refresh_secret)
            .await
            .is_ok());
    }
}
