// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for the authentication services.
//!
//! These types cross every service boundary, so they are plain serde values
//! with no behaviour that depends on a particular store.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

// =============================================================================
// Identifiers
// =============================================================================

/// A unique identifier for a user.
///
/// # Examples
///
/// ```
/// use lms_core::types::UserId;
///
/// let id = UserId::new();
/// let parsed: UserId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new time-ordered user ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[inline]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| AuthError::validation("user_id", e.to_string()))
    }
}

/// A unique identifier for a session.
///
/// Every access token carries the session id it was issued for, so logout can
/// always locate the session to revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new time-ordered session ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[inline]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| AuthError::validation("session_id", e.to_string()))
    }
}

// =============================================================================
// UserRole
// =============================================================================

/// The role a user holds within the LMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Learner enrolled in courses.
    Student,
    /// Teaching staff.
    Instructor,
    /// Administrator of a single institute.
    InstituteAdmin,
    /// Platform-wide administrator.
    SystemAdmin,
}

impl UserRole {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::InstituteAdmin => "institute_admin",
            UserRole::SystemAdmin => "system_admin",
        }
    }

    /// Parses a role from a string, accepting a few common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" | "learner" => Some(UserRole::Student),
            "instructor" | "teacher" | "lecturer" => Some(UserRole::Instructor),
            "institute_admin" | "institute-admin" | "instituteadmin" => {
                Some(UserRole::InstituteAdmin)
            }
            "system_admin" | "system-admin" | "systemadmin" | "sysadmin" => {
                Some(UserRole::SystemAdmin)
            }
            _ => None,
        }
    }

    /// Returns all roles, least privileged first.
    pub fn all() -> &'static [UserRole] {
        &[
            UserRole::Student,
            UserRole::Instructor,
            UserRole::InstituteAdmin,
            UserRole::SystemAdmin,
        ]
    }

    /// Returns `true` for administrative roles.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::InstituteAdmin | UserRole::SystemAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AuthError::validation("role", format!("unknown role '{}'", s)))
    }
}

// =============================================================================
// Client Metadata
// =============================================================================

/// Information about the client a session was created for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    /// Client IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ClientMeta {
    /// Creates client metadata.
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }
}

// =============================================================================
// Users
// =============================================================================

/// Public view of a user record. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Normalized email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Current role.
    pub role: UserRole,
    /// Whether the account may sign in.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// How a new user's credential is supplied.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Credential {
    /// A plaintext password to be hashed by the identity store.
    Plain(String),
    /// An already hashed password in PHC string format.
    Hashed(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Plain(_) => f.write_str("Credential::Plain(****)"),
            Credential::Hashed(_) => f.write_str("Credential::Hashed(****)"),
        }
    }
}

/// Registration request for the identity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Initial role.
    pub role: UserRole,
    /// Initial credential.
    pub credential: Credential,
}

impl NewUser {
    /// Creates a registration request with a plaintext password.
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: UserRole,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            role,
            credential: Credential::Plain(password.into()),
        }
    }

    /// Creates a registration request with a pre-hashed password.
    pub fn with_hash(
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: UserRole,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            role,
            credential: Credential::Hashed(password_hash.into()),
        }
    }
}

/// Normalizes an email address for lookup: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// Sessions
// =============================================================================

/// Result of creating or rotating a session.
///
/// `refresh_secret` is the raw secret. It is returned exactly once and only
/// its hash is kept by the session store.
#[derive(Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    /// Session ID.
    pub session_id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Role snapshot taken when the session was created.
    pub role: UserRole,
    /// Raw refresh secret.
    pub refresh_secret: String,
    /// When the refresh secret stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSession")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("refresh_secret", &"****")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Public view of an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session ID.
    pub session_id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Role snapshot.
    pub role: UserRole,
    /// Client the session was created for.
    pub client: ClientMeta,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful refresh.
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Current expiry.
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================
