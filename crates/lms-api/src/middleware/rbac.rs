// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route guards on the permissions an access token carries.
//!
//! The guard reads the [`AuthContext`] that [`AuthLayer`](super::AuthLayer)
//! stored, so it must sit inside the auth layer, usually as a
//! `route_layer`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use tracing::warn;

use lms_core::Permission;

use crate::auth::AuthContext;
use crate::error::ApiError;

/// What a guarded route demands.
#[derive(Debug, Clone)]
enum Requirement {
    One(Permission),
    All(Arc<[Permission]>),
    Any(Arc<[Permission]>),
}

impl Requirement {
    fn satisfied_by(&self, ctx: &AuthContext) -> bool {
        match self {
            Self::One(permission) => ctx.has_permission(*permission),
            Self::All(permissions) => ctx.has_all_permissions(permissions),
            Self::Any(permissions) => ctx.has_any_permission(permissions),
        }
    }
}

/// Layer producing [`RbacMiddleware`].
#[derive(Debug, Clone)]
pub struct RbacLayer {
    requirement: Requirement,
}

impl RbacLayer {
    /// Demands `permission`.
    pub fn require(permission: Permission) -> Self {
        Self {
            requirement: Requirement::One(permission),
        }
    }

    /// Demands every permission in `permissions`.
    pub fn require_all(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            requirement: Requirement::All(permissions.into_iter().collect()),
        }
    }

    /// Demands at least one permission in `permissions`.
    pub fn require_any(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            requirement: Requirement::Any(permissions.into_iter().collect()),
        }
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware {
            inner,
            requirement: self.requirement.clone(),
        }
    }
}

/// Answers 401 without a caller, 403 when the requirement is not met.
#[derive(Debug, Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
    requirement: Requirement,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
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
        let verdict = match req.extensions().get::<AuthContext>() {
            None => Err(ApiError::unauthorized("Authentication required")),
            Some(ctx) if self.requirement.satisfied_by(ctx) => Ok(()),
            Some(ctx) => {
                warn!(
                    user_id = %ctx.user_id,
                    role = %ctx.role,
                    requirement = ?self.requirement,
                    "Permission denied"
                );
                Err(ApiError::forbidden("Insufficient permissions"))
            }
        };

        // Take the service that was polled ready and leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move {
            match verdict {
                Ok(()) => inner.call(req).await,
                Err(rejection) => Ok(rejection.into_response()),
            }
        })
    }
}

/// Builds an [`RbacLayer`]: `require_permission!(p)`,
/// `require_permission!(all: p, q)` or `require_permission!(any: p, q)`.
#[macro_export]
macro_rules! require_permission {
    (all: $($perm:expr),+ $(,)?) => {
        $crate::middleware::RbacLayer::require_all([$($perm),+])
    };
    (any: $($perm:expr),+ $(,)?) => {
        $crate::middleware::RbacLayer::require_any([$($perm),+])
    };
    ($perm:expr) => {
        $crate::middleware::RbacLayer::require($perm)
    };
}
