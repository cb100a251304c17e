// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! A coordinator wired to mock collaborators, an in-memory audit sink and
//! the public router built on top of it.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use lms_api::{ApiConfig, ApiServer, AuthCoordinator, RateLimitConfig, TokenIssuer, TokenPair};
use lms_core::audit::InMemoryAuditLogger;
use lms_core::{AuthResult, IdentityService, UserProfile};
use lms_session::SessionStoreConfig;

use super::fixtures::{browser_client, token_config, TestAccount, ALL_ACCOUNTS};
use super::mocks::{MockAuthzService, MockIdentityService, MockSessionService};

// =============================================================================
// AuthHarness
// =============================================================================

/// Coordinator under test together with handles to its collaborators.
pub struct AuthHarness {
    /// Identity collaborator.
    pub identity: Arc<MockIdentityService>,
    /// Session collaborator.
    pub sessions: Arc<MockSessionService>,
    /// Authorization collaborator.
    pub authz: Arc<MockAuthzService>,
    /// Audit sink.
    pub audit: Arc<InMemoryAuditLogger>,
    /// Token issuer shared with the coordinator.
    pub issuer: Arc<TokenIssuer>,
    /// The coordinator.
    pub coordinator: Arc<AuthCoordinator>,
}

impl AuthHarness {
    /// Creates a harness with default session settings and every fixture
    /// account registered.
    pub async fn new() -> Self {
        Self::with_session_config(SessionStoreConfig::default()).await
    }

    /// Creates a harness with custom session settings.
    pub async fn with_session_config(config: SessionStoreConfig) -> Self {
        let identity = Arc::new(MockIdentityService::new());
        for account in ALL_ACCOUNTS {
            identity
                .register(account.new_user())
                .await
                .expect("fixture account registration");
        }

        let sessions = Arc::new(MockSessionService::new(config));
        let authz = Arc::new(MockAuthzService::new());
        let audit = Arc::new(InMemoryAuditLogger::new());
        let issuer = Arc::new(TokenIssuer::new(token_config()).expect("test token config"));

        let coordinator = AuthCoordinator::new(
            identity.clone(),
            sessions.clone(),
            authz.clone(),
            issuer.clone(),
        )
        .with_audit_logger(audit.clone());

        Self {
            identity,
            sessions,
            authz,
            audit,
            issuer,
            coordinator: Arc::new(coordinator),
        }
    }

    /// Logs in as a fixture account from a browser client.
    pub async fn login_as(&self, account: &TestAccount) -> AuthResult<TokenPair> {
        self.coordinator
            .login(account.email, account.password, browser_client())
            .await
    }

    /// Returns the stored profile of a fixture account.
    pub async fn profile_of(&self, account: &TestAccount) -> UserProfile {
        self.identity
            .validate_credentials(account.email, account.password)
            .await
            .expect("fixture account profile")
    }

    /// Builds the public router with rate limiting disabled.
    pub fn router(&self) -> Router {
        let config = ApiConfig::default().with_rate_limit(RateLimitConfig::disabled());
        ApiServer::from_parts(config, (*self.coordinator).clone()).router()
    }
}

// =============================================================================
// HTTP Driver
// =============================================================================

/// Sends one request through `router` and returns the status and JSON body.
///
/// An empty body is returned as `Value::Null`.
pub async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON response body")
    };
    (status, value)
}
