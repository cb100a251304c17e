// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Internal HTTP routes exposing the collaborator services.
//!
//! Routes are generic over the service traits, so the same router serves an
//! in-memory store or anything else that implements the contract.

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::{debug, warn};

use lms_core::secure::constant_time_eq;
use lms_core::{
    AuthError, AuthorizationService, IdentityService, IssuedSession, NewUser, SessionId,
    SessionInfo, SessionService, UserId, UserProfile,
};

use crate::wire::{
    CreateSessionRequest, ErrorBody, ListSessionsQuery, RefreshSessionRequest, ResolveRequest,
    ResolveResponse, RevokeAllRequest, RevokeAllResponse, UpdatePasswordRequest,
    ValidateCredentialsRequest, INTERNAL_KEY_HEADER,
};

// =============================================================================
// Error Response
// =============================================================================

/// An [`AuthError`] rendered as an internal error response.
#[derive(Debug)]
pub struct RpcError(pub AuthError);

impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            warn!(kind = %self.0.kind(), error = %self.0, "Internal call failed");
        } else {
            debug!(kind = %self.0.kind(), "Internal call rejected");
        }

        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

type RpcResult<T> = Result<T, RpcError>;

// =============================================================================
// Identity Routes
// =============================================================================

/// Routes for an [`IdentityService`].
pub fn identity_routes(service: Arc<dyn IdentityService>) -> Router {
    Router::new()
        .route("/internal/identity/validate", post(validate_credentials))
        .route("/internal/identity/users", post(register))
        .route(
            "/internal/identity/users/{user_id}",
            get(get_profile).delete(deactivate),
        )
        .route(
            "/internal/identity/users/{user_id}/password",
            put(update_password),
        )
        .with_state(service)
}

async fn validate_credentials(
    State(service): State<Arc<dyn IdentityService>>,
    Json(req): Json<ValidateCredentialsRequest>,
) -> RpcResult<Json<UserProfile>> {
    Ok(Json(
        service.validate_credentials(&req.email, &req.password).await?,
    ))
}

async fn get_profile(
    State(service): State<Arc<dyn IdentityService>>,
    Path(user_id): Path<UserId>,
) -> RpcResult<Json<UserProfile>> {
    Ok(Json(service.get_profile(user_id).await?))
}

async fn update_password(
    State(service): State<Arc<dyn IdentityService>>,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdatePasswordRequest>,
) -> RpcResult<StatusCode> {
    service
        .update_password(user_id, req.current_password.as_deref(), &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn register(
    State(service): State<Arc<dyn IdentityService>>,
    Json(user): Json<NewUser>,
) -> RpcResult<(StatusCode, Json<UserProfile>)> {
    let profile = service.register(user).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn deactivate(
    State(service): State<Arc<dyn IdentityService>>,
    Path(user_id): Path<UserId>,
) -> RpcResult<StatusCode> {
    service.deactivate(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Session Routes
// =============================================================================

/// Routes for a [`SessionService`].
pub fn session_routes(service: Arc<dyn SessionService>) -> Router {
    Router::new()
        .route("/internal/sessions", post(create_session).get(list_sessions))
        .route("/internal/sessions/refresh", post(refresh_session))
        .route("/internal/sessions/revoke-all", post(revoke_all))
        .route("/internal/sessions/{session_id}/revoke", post(revoke_session))
        .with_state(service)
}

async fn create_session(
    State(service): State<Arc<dyn SessionService>>,
    Json(req): Json<CreateSessionRequest>,
) -> RpcResult<(StatusCode, Json<IssuedSession>)> {
    let issued = service
        .create_session(req.user_id, req.role, req.client)
        .await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn refresh_session(
    State(service): State<Arc<dyn SessionService>>,
    Json(req): Json<RefreshSessionRequest>,
) -> RpcResult<Json<IssuedSession>> {
    Ok(Json(
        service.refresh_session(req.session_id, &req.secret).await?,
    ))
}

async fn revoke_session(
    State(service): State<Arc<dyn SessionService>>,
    Path(session_id): Path<SessionId>,
) -> RpcResult<StatusCode> {
    service.revoke_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn revoke_all(
    State(service): State<Arc<dyn SessionService>>,
    Json(req): Json<RevokeAllRequest>,
) -> RpcResult<Json<RevokeAllResponse>> {
    let revoked = service.revoke_all_for_user(req.user_id).await?;
    Ok(Json(RevokeAllResponse { revoked }))
}

async fn list_sessions(
    State(service): State<Arc<dyn SessionService>>,
    Query(query): Query<ListSessionsQuery>,
) -> RpcResult<Json<Vec<SessionInfo>>> {
    Ok(Json(service.list_sessions(query.user_id).await?))
}

// =============================================================================
// Authorization Routes
// =============================================================================

/// Routes for an [`AuthorizationService`].
pub fn authz_routes(service: Arc<dyn AuthorizationService>) -> Router {
    Router::new()
        .route("/internal/authz/resolve", post(resolve))
        .with_state(service)
}

async fn resolve(
    State(service): State<Arc<dyn AuthorizationService>>,
    Json(req): Json<ResolveRequest>,
) -> RpcResult<Json<ResolveResponse>> {
    let permissions = service.resolve(req.user_id, req.role).await?;
    Ok(Json(ResolveResponse { permissions }))
}

// =============================================================================
// Internal Router Builder
// =============================================================================

/// Assembles the internal routes for whichever services this process hosts.
#[derive(Default)]
pub struct InternalRouter {
    identity: Option<Arc<dyn IdentityService>>,
    session: Option<Arc<dyn SessionService>>,
    authz: Option<Arc<dyn AuthorizationService>>,
    api_key: Option<String>,
}

impl InternalRouter {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exposes an identity service.
    pub fn identity(mut self, service: Arc<dyn IdentityService>) -> Self {
        self.identity = Some(service);
        self
    }

    /// Exposes a session service.
    pub fn session(mut self, service: Arc<dyn SessionService>) -> Self {
        self.session = Some(service);
        self
    }

    /// Exposes an authorization service.
    pub fn authz(mut self, service: Arc<dyn AuthorizationService>) -> Self {
        self.authz = Some(service);
        self
    }

    /// Requires every call except `/internal/health` to present this key.
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    /// Returns `true` if no service is exposed.
    pub fn is_empty(&self) -> bool {
        self.identity.is_none() && self.session.is_none() && self.authz.is_none()
    }

    /// Builds the router.
    pub fn build(self) -> Router {
        let mut hosted = Vec::new();
        let mut router = Router::new();

        if let Some(service) = self.identity {
            hosted.push(service.name().to_string());
            router = router.merge(identity_routes(service));
        }
        if let Some(service) = self.session {
            hosted.push(service.name().to_string());
            router = router.merge(session_routes(service));
        }
        if let Some(service) = self.authz {
            hosted.push(service.name().to_string());
            router = router.merge(authz_routes(service));
        }

        if let Some(key) = self.api_key {
            router = router.layer(middleware::from_fn_with_state(
                Arc::<str>::from(key),
                require_internal_key,
            ));
        }

        let hosted = Arc::new(hosted);
        router.route(
            "/internal/health",
            get(move || {
                let hosted = hosted.clone();
                async move {
                    Json(serde_json::json!({
                        "status": "ok",
                        "services": *hosted,
                    }))
                }
            }),
        )
    }
}

async fn require_internal_key(State(key): State<Arc<str>>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(INTERNAL_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !constant_time_eq(presented, &key) {
        warn!(path = %request.uri().path(), "Internal call with missing or invalid key");
        return RpcError(AuthError::invalid_token("missing or invalid internal key")).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use lms_authz::PolicyResolver;
    use tower::ServiceExt;

    fn authz_router(key: Option<&str>) -> Router {
        InternalRouter::new()
            .authz(Arc::new(PolicyResolver::default()))
            .api_key(key.map(str::to_string))
            .build()
    }

    fn resolve_request(key: Option<&str>) -> HttpRequest<Body> {
        let body = serde_json::json!({
            "user_id": UserId::new(),
            "role": "student",
        });
        let mut builder = HttpRequest::builder()
            .method("POST")
            .uri("/internal/authz/resolve")
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(INTERNAL_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_route() {
        let response = authz_router(None)
            .oneshot(resolve_request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResolveResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.permissions.contains(lms_core::Permission::CourseRead));
    }

    #[tokio::test]
    async fn test_internal_key_required() {
        let router = authz_router(Some("k3y"));

        for presented in ["wrong", "k3", "k3y-longer"] {
            let denied = router
                .clone()
                .oneshot(resolve_request(Some(presented)))
                .await
                .unwrap();
            assert_eq!(denied.status(), StatusCode::UNAUTHORIZED, "{presented}");
        }

        let allowed = router.oneshot(resolve_request(Some("k3y"))).await.unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let response = authz_router(Some("k3y"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/internal/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["services"], serde_json::json!(["authz"]));
    }

    #[tokio::test]
    async fn test_errors_carry_kind() {
        let router = InternalRouter::new()
            .session(Arc::new(lms_session::InMemorySessionStore::default()))
            .build();
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri(format!("/internal/sessions/{}/revoke", SessionId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.kind, lms_core::AuthErrorKind::SessionNotFound);
    }
}
