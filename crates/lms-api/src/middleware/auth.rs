// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer authentication for every route that is not public.
//!
//! A valid access token becomes an [`AuthContext`] in the request
//! extensions; anything else is answered with 401 before the handler runs.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, request::Parts, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use uuid::Uuid;

use lms_core::AuthResult;

use crate::auth::{AuthContext, TokenIssuer};
use crate::error::ApiError;
use crate::extractors::{bearer_token, client_ip};

/// Paths served without a token. Logout is among them because it accepts
/// expired tokens.
pub const DEFAULT_PUBLIC_PATHS: [&str; 5] = [
    "/health",
    "/ready",
    "/auth/login",
    "/auth/refresh",
    "/auth/logout",
];

/// Exact paths plus `prefix*` patterns.
#[derive(Debug, Default)]
struct PublicPaths {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl PublicPaths {
    fn from_patterns<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut paths = Self::default();
        for pattern in patterns {
            match pattern.as_ref().strip_suffix('*') {
                Some(prefix) => paths.prefixes.push(prefix.to_string()),
                None => {
                    paths.exact.insert(pattern.as_ref().to_string());
                }
            }
        }
        paths
    }

    fn matches(&self, path: &str) -> bool {
        self.exact.contains(path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Layer producing [`AuthMiddleware`].
#[derive(Clone)]
pub struct AuthLayer {
    issuer: Arc<TokenIssuer>,
    public: Arc<PublicPaths>,
}

impl AuthLayer {
    /// Requires a token on every path.
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self {
            issuer,
            public: Arc::default(),
        }
    }

    /// Serves `paths` without a token. A trailing `*` matches any suffix.
    pub fn with_public_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.public = Arc::new(PublicPaths::from_patterns(paths));
        self
    }

    /// Serves [`DEFAULT_PUBLIC_PATHS`] without a token.
    pub fn with_default_public_paths(self) -> Self {
        self.with_public_paths(DEFAULT_PUBLIC_PATHS)
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            issuer: Arc::clone(&self.issuer),
            public: Arc::clone(&self.public),
        }
    }
}

/// See [`AuthLayer`].
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    issuer: Arc<TokenIssuer>,
    public: Arc<PublicPaths>,
}

impl<S> AuthMiddleware<S> {
    fn authenticate(&self, parts: &Parts) -> Result<AuthContext, ApiError> {
        let Some(token) = bearer_token(&parts.headers) else {
            tracing::debug!(path = %parts.uri.path(), "Request without bearer token");
            return Err(ApiError::unauthorized("No authorization token provided"));
        };

        let ctx: AuthResult<AuthContext> = self
            .issuer
            .validate(&token)
            .and_then(AuthContext::from_claims);
        let ctx = ctx.map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            ApiError::from(e)
        })?;

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(ctx
            .with_client_ip(client_ip(parts))
            .with_user_agent(user_agent)
            .with_request_id(Uuid::now_v7()))
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let req = if self.public.matches(req.uri().path()) {
            req
        } else {
            let (mut parts, body) = req.into_parts();
            match self.authenticate(&parts) {
                Ok(ctx) => {
                    parts.extensions.insert(ctx);
                    Request::from_parts(parts, body)
                }
                Err(rejection) => {
                    let response = rejection.into_response();
                    return Box::pin(async move { Ok(response) });
                }
            }
        };

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}
