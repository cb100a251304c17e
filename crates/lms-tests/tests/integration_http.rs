// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # HTTP Integration Tests
//!
//! The public endpoints driven through the full middleware stack, with
//! collaborator failures injected underneath.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use lms_tests::prelude::*;

async fn login(harness: &AuthHarness, account: &TestAccount) -> (StatusCode, Value) {
    call(
        &harness.router(),
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": account.email, "password": account.password })),
    )
    .await
}

// =============================================================================
// Full Flow
// =============================================================================

#[tokio::test]
async fn test_http_login_refresh_logout() {
    init_test_logging();
    let harness = AuthHarness::new().await;
    let router = harness.router();

    let (status, tokens) = login(&harness, &INSTRUCTOR).await;
    assert_eq!(status, StatusCode::OK, "{tokens}");
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 900);

    let (status, rotated) = call(
        &router,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": str_field(&tokens, "refresh_token") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{rotated}");
    assert_ne!(rotated["refresh_token"], tokens["refresh_token"]);

    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/logout",
        Some(str_field(&rotated, "access_token")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": str_field(&rotated, "refresh_token") })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_code(&body, "SESSION_EXPIRED_OR_REVOKED");
}

// =============================================================================
// Collaborator Failures
// =============================================================================

#[tokio::test]
async fn test_http_identity_unavailable() {
    let harness = AuthHarness::new().await;
    harness.identity.fail_validate.set(true);

    let (status, body) = login(&harness, &STUDENT).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_code(&body, "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_http_resolution_failure_is_server_error() {
    let harness = AuthHarness::new().await;
    harness.authz.fail_resolve.set(true);

    let (status, body) = login(&harness, &STUDENT).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_code(&body, "PERMISSION_RESOLUTION_FAILURE");
    assert_eq!(harness.sessions.revoked().len(), 1);
}

#[tokio::test]
async fn test_http_bad_credentials() {
    let harness = AuthHarness::new().await;

    let (status, body) = call(
        &harness.router(),
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": STUDENT.email, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_code(&body, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_http_logout_succeeds_when_store_fails() {
    let harness = AuthHarness::new().await;
    let (_, tokens) = login(&harness, &STUDENT).await;
    harness.sessions.fail_revoke.set(true);

    let (status, body) = call(
        &harness.router(),
        Method::POST,
        "/auth/logout",
        Some(str_field(&tokens, "access_token")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(harness.sessions.revoke_calls(), 1);
}

#[tokio::test]
async fn test_http_logout_without_token() {
    let harness = AuthHarness::new().await;

    let (status, _) = call(&harness.router(), Method::POST, "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &harness.router(),
        Method::POST,
        "/auth/logout",
        Some("definitely.not.ajwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.sessions.revoke_calls(), 0);
}

// =============================================================================
// Readiness
// =============================================================================

#[tokio::test]
async fn test_http_readiness_reports_unhealthy_collaborator() {
    let harness = AuthHarness::new().await;
    let router = harness.router();

    let (status, body) = call(&router, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    harness.identity.set_healthy(false);
    let (status, body) = call(&router, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    let unhealthy: Vec<&str> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["healthy"] == false)
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(unhealthy, vec!["mock-identity"]);
}

#[tokio::test]
async fn test_http_liveness_ignores_collaborators() {
    let harness = AuthHarness::new().await;
    harness.identity.set_healthy(false);

    let (status, _) = call(&harness.router(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
