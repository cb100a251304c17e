// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use lms_core::{SessionId, UserId, UserRole};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{bearer_token, Auth, Client, ValidatedJson};
use crate::response::{MessageResponse, PasswordChangedResponse, RevokedResponse, TokenResponse};
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /auth/login
///
/// Verifies credentials and returns an access and refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let pair = state
        .coordinator()
        .login(request.email.trim(), &request.password, client)
        .await?;

    Ok(Json(TokenResponse::from(pair)))
}

// =============================================================================
// Refresh
// =============================================================================

/// Refresh request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Encoded refresh token.
    pub refresh_token: String,
}

/// POST /auth/refresh
///
/// Rotates the refresh token and returns a new token pair. The presented
/// token is consumed whether or not the caller receives the response.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token is required"));
    }

    let pair = state.coordinator().refresh(&request.refresh_token).await?;
    Ok(Json(TokenResponse::from(pair)))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /auth/logout
///
/// Revokes the session of the presented access token. Always succeeds, even
/// for expired, unknown or missing tokens.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = bearer_token(&headers) {
        state.coordinator().logout(&token).await;
    }
    Json(MessageResponse::ok("Logged out"))
}

/// POST /auth/logout-all
///
/// Revokes every session of the caller, including the current one.
pub async fn logout_all(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let revoked = state.coordinator().logout_all(ctx.user_id).await?;
    Ok(Json(RevokedResponse { revoked }))
}

// =============================================================================
// Current User
// =============================================================================

/// Current user response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    /// User ID.
    pub user_id: UserId,
    /// Session of the presented token.
    pub session_id: SessionId,
    /// Role at issuance.
    pub role: UserRole,
    /// Permission names at issuance.
    pub permissions: Vec<String>,
    /// Access token expiry (Unix seconds).
    pub expires_at: i64,
}

/// GET /auth/me
///
/// Returns what the caller's access token asserts.
pub async fn current_user(Auth(ctx): Auth) -> impl IntoResponse {
    Json(CurrentUserResponse {
        user_id: ctx.user_id,
        session_id: ctx.session_id,
        role: ctx.role,
        permissions: ctx.permissions.to_names(),
        expires_at: ctx.expires_at,
    })
}

// =============================================================================
// Change Password
// =============================================================================

/// Change password request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub current_password: String,
    /// New password.
    pub new_password: String,
}

/// POST /auth/password
///
/// Changes the caller's password and revokes all of their sessions.
pub async fn change_password(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.current_password == request.new_password {
        return Err(ApiError::bad_request(
            "New password must differ from the current password",
        ));
    }

    let revoked = state
        .coordinator()
        .change_password(ctx.user_id, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(PasswordChangedResponse { revoked }))
}
