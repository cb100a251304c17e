// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use lms_core::{SessionId, UserId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::Auth;
use crate::response::{RevokedResponse, SessionView};
use crate::state::AppState;

/// GET /auth/sessions
///
/// Lists the caller's active sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let views: Vec<SessionView> = state
        .coordinator()
        .sessions(ctx.user_id)
        .await?
        .into_iter()
        .map(|info| SessionView::new(info, ctx.session_id))
        .collect();

    Ok(Json(views))
}

/// DELETE /auth/sessions/{session_id}
///
/// Revokes one of the caller's own sessions.
pub async fn revoke_session(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session_id: SessionId = session_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid session id"))?;

    state
        .coordinator()
        .revoke_own_session(ctx.user_id, session_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/users/{user_id}/revoke-sessions
///
/// Revokes every session of another user.
pub async fn revoke_user_sessions(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target: UserId = user_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid user id"))?;

    let revoked = state
        .coordinator()
        .revoke_user_sessions(ctx.user_id, target)
        .await?;

    Ok(Json(RevokedResponse { revoked }))
}
