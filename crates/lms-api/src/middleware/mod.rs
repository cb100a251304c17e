// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tower layers of the public router, outermost first: rate limiting,
//! bearer authentication, and per-route permission guards.

mod auth;
mod rate_limit;
mod rbac;

pub use auth::{AuthLayer, AuthMiddleware, DEFAULT_PUBLIC_PATHS};
pub use rate_limit::{
    RateLimitConfig, RateLimitLayer, RateLimitMiddleware, RateLimitResult, RateLimiterState,
};
pub use rbac::{RbacLayer, RbacMiddleware};
