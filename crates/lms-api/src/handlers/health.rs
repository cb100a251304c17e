// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// GET /health
///
/// Liveness check. Returns 200 OK while the process is serving requests.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

/// GET /ready
///
/// Readiness check that probes every collaborator service.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let components: Vec<ComponentStatus> = state
        .coordinator()
        .health()
        .await
        .into_iter()
        .map(|(name, healthy)| ComponentStatus { name, healthy })
        .collect();

    let ready = components.iter().all(|c| c.healthy);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, components }))
}
