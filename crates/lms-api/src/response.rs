// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lms_core::{ClientMeta, SessionId, SessionInfo, UserRole};

use crate::coordinator::TokenPair;

// =============================================================================
// Token Responses
// =============================================================================

/// Body returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Encoded refresh token.
    pub refresh_token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// When the refresh token stops being accepted.
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access.token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.access.expires_in,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a successful acknowledgement.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Result of a bulk revocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokedResponse {
    /// Number of sessions revoked.
    pub revoked: usize,
}

/// Result of a password change.
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordChangedResponse {
    /// Sessions revoked by the change, `null` when the session store could
    /// not be reached.
    pub revoked: Option<usize>,
}

// =============================================================================
// Session Views
// =============================================================================

/// A session as shown to its owner.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    /// Session ID.
    pub session_id: SessionId,
    /// Role snapshot.
    pub role: UserRole,
    /// Client metadata.
    pub client: ClientMeta,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Current expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session of the calling token.
    pub current: bool,
}

impl SessionView {
    /// Creates a view, marking the caller's own session.
    pub fn new(info: SessionInfo, current_session: SessionId) -> Self {
        Self {
            current: info.session_id == current_session,
            session_id: info.session_id,
            role: info.role,
            client: info.client,
            created_at: info.created_at,
            last_refreshed_at: info.last_refreshed_at,
            expires_at: info.expires_at,
        }
    }
}

// =============================================================================
// Health Responses
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Readiness check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service is ready.
    pub ready: bool,
    /// Component statuses.
    pub components: Vec<ComponentStatus>,
}

/// Status of a collaborator.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Component name.
    pub name: String,
    /// Whether the component is healthy.
    pub healthy: bool,
}

// =============================================================================
// Tests
// =============================================================================
