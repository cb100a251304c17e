// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit records and the filter used to query them.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ClientMeta, SessionId, UserId};

// =============================================================================
// Audit Log Entry
// =============================================================================

/// A single audit log entry.
///
/// Each entry records one authentication event: who, from where, against
/// which session, and how it ended. Secrets never appear in an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique log entry ID.
    pub id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the event.
    pub severity: AuditSeverity,

    /// User the event concerns (if known).
    pub user_id: Option<String>,

    /// Client IP address.
    pub client_ip: Option<IpAddr>,

    /// The action that was performed.
    pub action: AuditAction,

    /// The resource that was affected.
    pub resource: AuditResource,

    /// Additional details about the action.
    pub details: serde_json::Value,

    /// The result of the action.
    pub result: ActionResult,

    /// Duration of the operation in milliseconds.
    pub duration_ms: Option<u64>,

    /// Session ID (if applicable).
    pub session_id: Option<String>,

    /// User agent string.
    pub user_agent: Option<String>,
}

impl AuditLog {
    /// Creates a new audit log entry.
    pub fn new(action: AuditAction, resource: AuditResource, result: ActionResult) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            severity: action.default_severity(),
            user_id: None,
            client_ip: None,
            action,
            resource,
            details: serde_json::Value::Null,
            result,
            duration_ms: None,
            session_id: None,
            user_agent: None,
        }
    }

    /// Sets the user.
    pub fn with_user(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Copies the client address and user agent.
    pub fn with_client(mut self, client: &ClientMeta) -> Self {
        self.client_ip = client.ip;
        self.user_agent = client.user_agent.clone();
        self
    }

    /// Sets the details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the session ID.
    pub fn with_session_id(mut self, session_id: impl ToString) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    // =========================================================================
    // Factory methods for common actions
    // =========================================================================

    /// Creates an audit log for a successful login.
    pub fn login(user_id: UserId, session_id: SessionId, client: &ClientMeta) -> Self {
        Self::new(
            AuditAction::Login,
            AuditResource::session(session_id),
            ActionResult::Success,
        )
        .with_user(user_id)
        .with_session_id(session_id)
        .with_client(client)
    }

    /// Creates an audit log for a failed login.
    ///
    /// The attempted email is kept in the details because no user id is known.
    pub fn login_failed(email: &str, client: &ClientMeta, reason: impl Into<String>) -> Self {
        Self::new(
            AuditAction::LoginFailed,
            AuditResource::account(email),
            ActionResult::failure(reason),
        )
        .with_client(client)
        .with_details(serde_json::json!({ "email": email }))
    }

    /// Creates an audit log for a refresh token rotation.
    pub fn token_refresh(user_id: UserId, session_id: SessionId, result: ActionResult) -> Self {
        let severity = if result.is_success() {
            AuditSeverity::Info
        } else {
            AuditSeverity::Warning
        };
        Self::new(AuditAction::TokenRefresh, AuditResource::session(session_id), result)
            .with_user(user_id)
            .with_session_id(session_id)
            .with_severity(severity)
    }

    /// Creates an audit log for a refresh attempt that was refused before the
    /// owning user was known.
    pub fn token_refresh_rejected(session_id: Option<SessionId>, reason: impl Into<String>) -> Self {
        let resource = match session_id {
            Some(id) => AuditResource::session(id),
            None => AuditResource::new("session", "unknown"),
        };
        let mut log = Self::new(
            AuditAction::TokenRefresh,
            resource,
            ActionResult::rejected(reason),
        )
        .with_severity(AuditSeverity::Warning);
        if let Some(id) = session_id {
            log = log.with_session_id(id);
        }
        log
    }

    /// Creates an audit log for a logout.
    pub fn logout(user_id: impl ToString, session_id: SessionId, result: ActionResult) -> Self {
        Self::new(AuditAction::Logout, AuditResource::session(session_id), result)
            .with_user(user_id)
            .with_session_id(session_id)
    }

    /// Creates an audit log for a bulk session revocation.
    pub fn sessions_revoked(actor: impl ToString, target: UserId, count: usize) -> Self {
        Self::new(
            AuditAction::SessionRevokeAll,
            AuditResource::user(target),
            ActionResult::Success,
        )
        .with_user(actor)
        .with_details(serde_json::json!({ "revoked": count }))
    }

    /// Creates an audit log for a password change.
    pub fn password_change(user_id: UserId, result: ActionResult) -> Self {
        Self::new(AuditAction::PasswordChange, AuditResource::user(user_id), result)
            .with_user(user_id)
    }

    /// Creates an audit log for system start.
    pub fn system_start(version: impl Into<String>) -> Self {
        Self::new(
            AuditAction::SystemStart,
            AuditResource::system(),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({
            "version": version.into(),
        }))
    }

    /// Creates an audit log for system shutdown.
    pub fn system_shutdown(reason: Option<String>) -> Self {
        let details = match reason {
            Some(r) => serde_json::json!({ "reason": r }),
            None => serde_json::Value::Null,
        };

        Self::new(
            AuditAction::SystemShutdown,
            AuditResource::system(),
            ActionResult::Success,
        )
        .with_details(details)
    }
}

// =============================================================================
// Severity
// =============================================================================

/// How much attention an entry deserves. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    /// Routine token traffic.
    #[default]
    Info,
    /// Account or session changes made on purpose.
    Notice,
    /// Refused attempts.
    Warning,
    /// Likely token theft.
    Critical,
}

impl AuditSeverity {
    /// Returns the severity name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "info",
            AuditSeverity::Notice => "notice",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Action
// =============================================================================

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Credentials accepted and a session opened.
    Login,
    /// Credentials refused, or a later login step failed.
    LoginFailed,
    /// One session ended by its owner.
    Logout,
    /// Refresh token presented for rotation.
    TokenRefresh,
    /// An already rotated refresh token was presented again.
    TokenReuse,
    /// Every session of a user revoked at once.
    SessionRevokeAll,
    /// Password changed.
    PasswordChange,
    /// Process started.
    SystemStart,
    /// Process stopping.
    SystemShutdown,
}

impl AuditAction {
    /// Returns the action name as written to the audit trail.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Logout => "logout",
            AuditAction::TokenRefresh => "token_refresh",
            AuditAction::TokenReuse => "token_reuse",
            AuditAction::SessionRevokeAll => "session_revoke_all",
            AuditAction::PasswordChange => "password_change",
            AuditAction::SystemStart => "system_start",
            AuditAction::SystemShutdown => "system_shutdown",
        }
    }

    /// Severity an entry gets unless its factory says otherwise.
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            AuditAction::Login | AuditAction::Logout | AuditAction::TokenRefresh => {
                AuditSeverity::Info
            }
            AuditAction::LoginFailed => AuditSeverity::Warning,
            AuditAction::TokenReuse => AuditSeverity::Critical,
            AuditAction::SessionRevokeAll
            | AuditAction::PasswordChange
            | AuditAction::SystemStart
            | AuditAction::SystemShutdown => AuditSeverity::Notice,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Resource
// =============================================================================

/// The account, session or process an entry is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResource {
    /// `user`, `account`, `session` or `system`.
    pub kind: String,
    /// Identifier within `kind`.
    pub id: String,
}

impl AuditResource {
    /// Creates a resource.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// A known user.
    pub fn user(user_id: UserId) -> Self {
        Self::new("user", user_id.to_string())
    }

    /// An email address that may or may not belong to a user.
    pub fn account(email: impl Into<String>) -> Self {
        Self::new("account", email)
    }

    /// A session.
    pub fn session(session_id: SessionId) -> Self {
        Self::new("session", session_id.to_string())
    }

    /// This process.
    pub fn system() -> Self {
        Self::new("system", "lms-auth")
    }
}

impl std::fmt::Display for AuditResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// =============================================================================
// Result
// =============================================================================

/// How the action ended.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResult {
    /// Completed.
    #[default]
    Success,
    /// Broke part way, e.g. a collaborator was unreachable.
    Failure {
        /// Error kind or short description.
        reason: String,
    },
    /// Refused on purpose, e.g. a stale refresh token.
    Rejected {
        /// Error kind or short description.
        reason: String,
    },
}

impl ActionResult {
    /// A failure.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// A refusal.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns `true` on success.
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success)
    }

    /// Returns `true` unless the action succeeded.
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The reason, when there is one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ActionResult::Success => None,
            ActionResult::Failure { reason } | ActionResult::Rejected { reason } => Some(reason),
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Selects entries from a queryable sink. Empty fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Acting or affected user.
    pub user_id: Option<String>,
    /// Action.
    pub action: Option<AuditAction>,
    /// Session.
    pub session_id: Option<String>,
    /// Lowest severity to include.
    pub min_severity: Option<AuditSeverity>,
    /// Entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
    /// Newest entries first.
    #[serde(default)]
    pub newest_first: bool,
}

impl AuditFilter {
    /// Matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only entries of `user_id`.
    pub fn user(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Only `action` entries.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Only entries of one session.
    pub fn session(mut self, session_id: impl ToString) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Only entries at least as severe as `severity`.
    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Only entries at or after `since`.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Caps the result size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the newest entries first.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Returns `true` if `log` passes every set criterion.
    pub fn matches(&self, log: &AuditLog) -> bool {
        let same = |want: &Option<String>, have: &Option<String>| {
            want.as_ref().map_or(true, |w| have.as_ref() == Some(w))
        };

        same(&self.user_id, &log.user_id)
            && same(&self.session_id, &log.session_id)
            && self.action.map_or(true, |a| a == log.action)
            && self.min_severity.map_or(true, |s| log.severity >= s)
            && self.since.map_or(true, |t| log.timestamp >= t)
    }
}

// =============================================================================
// Tests
// =============================================================================
