// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Flow Integration Tests
//!
//! Login, refresh and logout driven through the coordinator with mock
//! collaborators.
//!
//! ## Test Categories
//!
//! - `test_login_*`: Credential checks and issued claims
//! - `test_refresh_*`: Rotation and reuse
//! - `test_logout_*`: Session termination
//! - `test_expiry_*`: Access token lifetime boundaries
//! - `test_compensation_*`: Cleanup after partial failures
//! - `test_password_*`: Password change and session revocation
//! - `test_audit_*`: Audit trail behaviour

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use lms_api::AuthCoordinator;
use lms_core::audit::AuditAction;
use lms_core::{
    AuthorizationService, IdentityService, Permission, PermissionSet, SessionId, UserRole,
};
use lms_session::SessionStoreConfig;
use lms_tests::prelude::*;

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_claims_carry_resolved_permissions() {
    init_test_logging();
    let harness = AuthHarness::new().await;

    for account in ALL_ACCOUNTS {
        let profile = harness.profile_of(&account).await;
        let pair = harness.login_as(&account).await.unwrap();
        let claims = harness.issuer.validate(&pair.access.token).unwrap();

        let expected = harness
            .authz
            .resolver()
            .resolve(profile.id, profile.role)
            .await
            .unwrap();

        assert_eq!(claims.user_id().unwrap(), profile.id);
        assert_eq!(claims.role, account.role);
        assert_eq!(claims.permissions, expected);
        assert_eq!(claims.session_id().unwrap(), pair.session_id);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(pair.access.expires_in, 900);
    }
}

#[tokio::test]
async fn test_login_student_lacks_admin_permissions() {
    let harness = AuthHarness::new().await;

    let student = harness.login_as(&STUDENT).await.unwrap();
    let admin = harness.login_as(&ADMIN).await.unwrap();

    assert!(student.access.claims.has_permission(Permission::CourseRead));
    assert!(!student.access.claims.has_permission(Permission::SystemAdmin));
    assert!(admin.access.claims.has_permission(Permission::SystemAdmin));
}

#[tokio::test]
async fn test_login_wrong_password_opens_no_session() {
    let harness = AuthHarness::new().await;

    let err = harness
        .coordinator
        .login(STUDENT.email, "not-the-password", browser_client())
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::InvalidCredentials);

    let err = harness
        .coordinator
        .login("nobody@example.edu", STUDENT.password, browser_client())
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::InvalidCredentials);

    assert_eq!(harness.sessions.create_calls(), 0);
    assert_eq!(harness.authz.resolve_calls(), 0);
    assert_eq!(harness.audit.entries_for_action(AuditAction::LoginFailed).len(), 2);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let harness = AuthHarness::new().await;

    let pair = harness
        .coordinator
        .login("Student@Example.EDU", STUDENT.password, browser_client())
        .await
        .unwrap();
    assert_eq!(pair.access.claims.role, UserRole::Student);
}

#[tokio::test]
async fn test_login_identity_unavailable() {
    let harness = AuthHarness::new().await;
    harness.identity.fail_validate.set(true);

    let err = harness.login_as(&STUDENT).await.unwrap_err();
    assert_kind(&err, AuthErrorKind::UpstreamUnavailable);
    assert_eq!(harness.sessions.create_calls(), 0);
}

#[tokio::test]
async fn test_login_session_service_unavailable() {
    let harness = AuthHarness::new().await;
    harness.sessions.fail_create.once();

    let err = harness.login_as(&STUDENT).await.unwrap_err();
    assert_kind(&err, AuthErrorKind::UpstreamUnavailable);
    assert_eq!(harness.authz.resolve_calls(), 0);
    assert_eq!(harness.sessions.revoke_calls(), 0);

    // The failure was transient.
    assert!(harness.login_as(&STUDENT).await.is_ok());
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_rotates_and_rejects_previous_token() {
    let harness = AuthHarness::new().await;
    let first = harness.login_as(&STUDENT).await.unwrap();

    let second = harness.coordinator.refresh(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.session_id, first.session_id);
    assert_ne!(second.access.claims.jti, first.access.claims.jti);

    let err = harness
        .coordinator
        .refresh(&first.refresh_token)
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
}

#[tokio::test]
async fn test_refresh_reuse_revokes_session() {
    let harness =
        AuthHarness::with_session_config(SessionStoreConfig::default().with_reuse_grace(Duration::ZERO))
            .await;
    let first = harness.login_as(&STUDENT).await.unwrap();
    let second = harness.coordinator.refresh(&first.refresh_token).await.unwrap();

    // Replaying the rotated token ends the whole session.
    assert!(harness.coordinator.refresh(&first.refresh_token).await.is_err());

    let err = harness
        .coordinator
        .refresh(&second.refresh_token)
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
    assert!(harness
        .sessions
        .store()
        .get(first.session_id)
        .unwrap()
        .is_revoked());
}

#[tokio::test]
async fn test_refresh_reuse_tolerated_when_revocation_disabled() {
    let harness =
        AuthHarness::with_session_config(SessionStoreConfig::default().with_revoke_on_reuse(false))
            .await;
    let first = harness.login_as(&STUDENT).await.unwrap();
    let second = harness.coordinator.refresh(&first.refresh_token).await.unwrap();

    assert!(harness.coordinator.refresh(&first.refresh_token).await.is_err());
    assert!(harness.coordinator.refresh(&second.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_refresh_malformed_token() {
    let harness = AuthHarness::new().await;

    for garbage in ["", "not base64!", "bm8tY29sb24=", "Og=="] {
        let err = harness.coordinator.refresh(garbage).await.unwrap_err();
        assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
    }
    assert_eq!(harness.sessions.refresh_calls(), 0);
}

#[tokio::test]
async fn test_refresh_unknown_session() {
    let harness = AuthHarness::new().await;
    let forged = lms_core::RefreshToken::new(SessionId::new(), "made-up-secret").encode();

    let err = harness.coordinator.refresh(&forged).await.unwrap_err();
    assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
}

#[tokio::test]
async fn test_refresh_deactivated_user() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    harness.identity.deactivate(profile.id).await.unwrap();

    let err = harness
        .coordinator
        .refresh(&pair.refresh_token)
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
    assert!(harness
        .sessions
        .store()
        .get(pair.session_id)
        .unwrap()
        .is_revoked());
}

#[tokio::test]
async fn test_refresh_spends_token_when_resolution_fails() {
    let harness = AuthHarness::new().await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    harness.authz.fail_resolve.once();
    let err = harness
        .coordinator
        .refresh(&pair.refresh_token)
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::PermissionResolutionFailure);

    let err = harness
        .coordinator
        .refresh(&pair.refresh_token)
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
}

#[tokio::test]
async fn test_refresh_concurrent_single_winner() {
    init_test_logging();
    let harness = AuthHarness::new().await;
    let pair = harness.login_as(&STUDENT).await.unwrap();
    harness
        .sessions
        .set_refresh_delay(Duration::from_millis(20));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let coordinator = Arc::clone(&harness.coordinator);
        let token = pair.refresh_token.clone();
        tasks.push(tokio::spawn(async move { coordinator.refresh(&token).await }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(rotated) => winners.push(rotated),
            Err(e) => assert_kind(&e, AuthErrorKind::SessionExpiredOrRevoked),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(harness.sessions.refresh_calls(), 8);

    harness.sessions.set_refresh_delay(Duration::ZERO);
    assert!(!harness
        .sessions
        .store()
        .get(pair.session_id)
        .unwrap()
        .is_revoked());
    assert!(harness
        .coordinator
        .refresh(&winners[0].refresh_token)
        .await
        .is_ok());
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_ends_refresh() {
    let harness = AuthHarness::new().await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    harness.coordinator.logout(&pair.access.token).await;

    let err = harness
        .coordinator
        .refresh(&pair.refresh_token)
        .await
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::SessionExpiredOrRevoked);
    assert_eq!(harness.sessions.revoked(), vec![pair.session_id]);
}

#[tokio::test]
async fn test_logout_leaves_other_sessions() {
    let harness = AuthHarness::new().await;
    let laptop = harness.login_as(&STUDENT).await.unwrap();
    let phone = harness.login_as(&STUDENT).await.unwrap();

    harness.coordinator.logout(&laptop.access.token).await;

    assert!(harness.coordinator.refresh(&laptop.refresh_token).await.is_err());
    assert!(harness.coordinator.refresh(&phone.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_logout_is_best_effort() {
    let harness = AuthHarness::new().await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    // Garbage and foreign tokens are ignored without touching the store.
    harness.coordinator.logout("not-a-jwt").await;
    assert_eq!(harness.sessions.revoke_calls(), 0);

    // A failing store is swallowed.
    harness.sessions.fail_revoke.once();
    harness.coordinator.logout(&pair.access.token).await;
    assert_eq!(harness.sessions.revoke_calls(), 1);
    assert!(harness.coordinator.refresh(&pair.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_logout_accepts_expired_access_token() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let stale = harness
        .issuer
        .sign_at(
            profile.id,
            profile.role,
            PermissionSet::new(),
            pair.session_id,
            issued_at,
        )
        .unwrap();
    assert!(harness.issuer.validate(&stale.token).is_err());

    harness.coordinator.logout(&stale.token).await;
    assert!(harness.coordinator.refresh(&pair.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_logout_twice() {
    let harness = AuthHarness::new().await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    harness.coordinator.logout(&pair.access.token).await;
    harness.coordinator.logout(&pair.access.token).await;
    assert_eq!(harness.sessions.revoke_calls(), 2);
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn test_expiry_boundary_is_exclusive() {
    let harness = AuthHarness::new().await;
    let pair = harness.login_as(&INSTRUCTOR).await.unwrap();
    let claims = &pair.access.claims;

    assert!(harness
        .issuer
        .validate_at(&pair.access.token, claims.exp - 1)
        .is_ok());

    let err = harness
        .issuer
        .validate_at(&pair.access.token, claims.exp)
        .unwrap_err();
    assert_kind(&err, AuthErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_expiry_fifteen_minutes_after_issue() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;
    let issued_at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();

    let token = harness
        .issuer
        .sign_at(
            profile.id,
            profile.role,
            PermissionSet::new(),
            SessionId::new(),
            issued_at,
        )
        .unwrap();

    let start = issued_at.timestamp();
    assert_eq!(token.expires_at.timestamp(), start + 900);
    assert!(harness.issuer.validate_at(&token.token, start).is_ok());
    assert!(harness.issuer.validate_at(&token.token, start + 899).is_ok());
    assert!(harness.issuer.validate_at(&token.token, start + 900).is_err());
    assert!(harness.issuer.validate_at(&token.token, start - 1).is_err());
}

// =============================================================================
// Compensation
// =============================================================================

#[tokio::test]
async fn test_compensation_revokes_session_when_resolution_fails() {
    let harness = AuthHarness::new().await;
    harness.authz.fail_resolve.set(true);

    let err = harness.login_as(&STUDENT).await.unwrap_err();
    assert_kind(&err, AuthErrorKind::PermissionResolutionFailure);

    assert_eq!(harness.sessions.create_calls(), 1);
    let revoked = harness.sessions.revoked();
    assert_eq!(revoked.len(), 1);
    assert!(harness.sessions.store().get(revoked[0]).unwrap().is_revoked());

    let profile = harness.profile_of(&STUDENT).await;
    assert!(harness
        .coordinator
        .sessions(profile.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_compensation_failure_keeps_original_error() {
    let harness = AuthHarness::new().await;
    harness.authz.fail_resolve.set(true);
    harness.sessions.fail_revoke.set(true);

    let err = harness.login_as(&STUDENT).await.unwrap_err();
    assert_kind(&err, AuthErrorKind::PermissionResolutionFailure);
    assert_eq!(harness.sessions.revoke_calls(), 1);
    assert!(harness.sessions.revoked().is_empty());
}

// =============================================================================
// Password
// =============================================================================

const NEW_PASSWORD: &str = "brand-new-pass-9";

#[tokio::test]
async fn test_password_change_revokes_sessions() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;
    let pair = harness.login_as(&STUDENT).await.unwrap();

    let revoked = harness
        .coordinator
        .change_password(profile.id, STUDENT.password, NEW_PASSWORD)
        .await
        .unwrap();
    assert_eq!(revoked, Some(1));
    assert!(harness.coordinator.refresh(&pair.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_password_change_retries_revocation() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;
    let pair = harness.login_as(&STUDENT).await.unwrap();
    harness.sessions.fail_revoke_all.once();

    let revoked = harness
        .coordinator
        .change_password(profile.id, STUDENT.password, NEW_PASSWORD)
        .await
        .unwrap();
    assert_eq!(revoked, Some(1));
    assert!(harness
        .sessions
        .store()
        .get(pair.session_id)
        .unwrap()
        .is_revoked());
}

#[tokio::test]
async fn test_password_change_succeeds_when_session_store_is_down() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;
    harness.sessions.fail_revoke_all.set(true);

    let revoked = harness
        .coordinator
        .change_password(profile.id, STUDENT.password, NEW_PASSWORD)
        .await
        .unwrap();
    assert_eq!(revoked, None);

    // The new password is in effect.
    assert!(harness
        .coordinator
        .login(STUDENT.email, NEW_PASSWORD, browser_client())
        .await
        .is_ok());

    let changes = harness.audit.entries_for_action(AuditAction::PasswordChange);
    assert_eq!(changes.len(), 1);
    assert!(changes[0].result.is_success());
    assert!(changes[0].details["revoked"].is_null());
}

// =============================================================================
// Audit
// =============================================================================

#[tokio::test]
async fn test_audit_records_token_lifecycle() {
    let harness = AuthHarness::new().await;
    let profile = harness.profile_of(&STUDENT).await;

    let pair = harness.login_as(&STUDENT).await.unwrap();
    let rotated = harness.coordinator.refresh(&pair.refresh_token).await.unwrap();
    harness.coordinator.logout(&rotated.access.token).await;

    let user = profile.id.to_string();
    let logins = harness.audit.entries_for_action(AuditAction::Login);
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].user_id.as_deref(), Some(user.as_str()));
    assert!(logins[0].result.is_success());

    assert_eq!(harness.audit.entries_for_action(AuditAction::TokenRefresh).len(), 1);
    assert_eq!(harness.audit.entries_for_action(AuditAction::Logout).len(), 1);
}

#[tokio::test]
async fn test_audit_failure_does_not_block_login() {
    let harness = AuthHarness::new().await;
    let failing = Arc::new(FailingAuditLogger::new());
    let coordinator = AuthCoordinator::new(
        harness.identity.clone(),
        harness.sessions.clone(),
        harness.authz.clone(),
        harness.issuer.clone(),
    )
    .with_audit_logger(failing.clone());

    let pair = coordinator
        .login(STUDENT.email, STUDENT.password, browser_client())
        .await
        .unwrap();
    coordinator.refresh(&pair.refresh_token).await.unwrap();

    assert_eq!(failing.attempts(), 2);
}
