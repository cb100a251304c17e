// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Public API server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use lms_core::Permission;

use crate::config::{ApiConfig, CorsConfig};
use crate::coordinator::AuthCoordinator;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, RateLimitLayer};
use crate::require_permission;
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The public authentication API server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
    extra_routes: Option<Router>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self {
            state,
            config,
            extra_routes: None,
        }
    }

    /// Creates a server from a configuration and a coordinator.
    pub fn from_parts(config: ApiConfig, coordinator: AuthCoordinator) -> Self {
        Self::new(AppState::new(config, coordinator))
    }

    /// Serves additional routes on the same listener.
    ///
    /// The routes share the request quotas of the public API but none of
    /// its other middleware, so they must authenticate callers themselves.
    pub fn with_extra_routes(mut self, routes: Router) -> Self {
        self.extra_routes = Some(match self.extra_routes.take() {
            Some(existing) => existing.merge(routes),
            None => routes,
        });
        self
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = create_cors_layer(&self.config);
        let rate_limit = RateLimitLayer::new(self.config.rate_limit.clone());
        let auth = AuthLayer::new(self.state.issuer().clone()).with_default_public_paths();

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(cors)
            .layer(rate_limit.clone())
            .layer(auth);

        let public = Router::new()
            // Health endpoints
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            // Token lifecycle
            .route("/auth/login", post(handlers::login))
            .route("/auth/refresh", post(handlers::refresh))
            .route("/auth/logout", post(handlers::logout))
            .route("/auth/logout-all", post(handlers::logout_all))
            .route("/auth/me", get(handlers::current_user))
            .route("/auth/password", post(handlers::change_password))
            // Sessions
            .route(
                "/auth/sessions",
                get(handlers::list_sessions)
                    .route_layer(require_permission!(Permission::SessionRead)),
            )
            .route(
                "/auth/sessions/{session_id}",
                delete(handlers::revoke_session)
                    .route_layer(require_permission!(Permission::SessionRead)),
            )
            .route(
                "/auth/users/{user_id}/revoke-sessions",
                post(handlers::revoke_user_sessions)
                    .route_layer(require_permission!(Permission::SessionAdmin)),
            )
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(middleware_stack)
            .with_state(self.state.clone());

        match &self.extra_routes {
            Some(extra) => public.merge(extra.clone().layer(rate_limit)),
            None => public,
        }
    }

    /// Binds the configured address and serves until `shutdown_signal`
    /// resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.listen;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {addr}: {e}")))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener until `shutdown_signal` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let local = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Listener has no address: {e}")))?;

        info!(addr = %local, "Starting API server");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {e}")))?;

        info!("API server shutdown complete");
        Ok(())
    }

    /// Returns the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.listen
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds the CORS layer. Only the methods the public routes use are allowed.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .max_age(config.cors.max_age())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    match &config.cors {
        CorsConfig::Any { .. } => layer.allow_origin(Any),
        CorsConfig::Origins {
            origins,
            credentials,
            ..
        } => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect();
            layer
                .allow_origin(AllowOrigin::list(origins))
                .allow_credentials(*credentials)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_variants() {
        let _any = create_cors_layer(&ApiConfig::default());
        let _strict = create_cors_layer(
            &ApiConfig::default()
                .with_cors(CorsConfig::origins(vec!["https://lms.example.edu".to_string()])),
        );
    }
}
