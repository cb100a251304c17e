// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request throttling for the public API.
//!
//! Each request is checked against a quota shared by all clients and a quota
//! per peer address, using the generic cell rate algorithm: a quota only
//! stores the theoretical arrival time (TAT) of the next request. Peer
//! addresses come from the socket, never from forwarding headers.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tower::{Layer, Service};

use crate::error::ApiError;

// =============================================================================
// RateLimitConfig
// =============================================================================

/// Throttling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Off switch.
    pub enabled: bool,
    /// Sustained rate across all clients.
    pub requests_per_second: u32,
    /// Requests all clients may send at once.
    pub burst_size: u32,
    /// Whether each peer address also gets its own quota.
    pub per_ip: bool,
    /// Sustained rate of one address.
    pub per_ip_requests_per_second: u32,
    /// Requests one address may send at once.
    pub per_ip_burst_size: u32,
    /// Address count above which idle addresses are forgotten.
    pub max_tracked_clients: usize,
    /// How long an address must be quiet to count as idle.
    pub idle_timeout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 200,
            burst_size: 400,
            per_ip: true,
            per_ip_requests_per_second: 10,
            per_ip_burst_size: 20,
            max_tracked_clients: 10_000,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl RateLimitConfig {
    /// Admits everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// =============================================================================
// Quota
// =============================================================================

/// Spacing between requests and how far ahead of it a burst may run.
#[derive(Debug, Clone, Copy)]
struct Quota {
    emission: Duration,
    tolerance: Duration,
}

impl Quota {
    fn new(per_second: u32, burst: u32) -> Self {
        let emission = Duration::from_secs(1) / per_second.max(1);
        Self {
            emission,
            tolerance: emission * burst.max(1).saturating_sub(1),
        }
    }

    /// Admits a request arriving at `now`, advancing `tat`. On refusal
    /// returns how long until the request would be admitted.
    fn admit(&self, tat: &mut Instant, now: Instant) -> Result<(), Duration> {
        let start = (*tat).max(now);
        let ahead = start - now;
        if ahead > self.tolerance {
            return Err(ahead - self.tolerance);
        }
        *tat = start + self.emission;
        Ok(())
    }
}

fn whole_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

// =============================================================================
// RateLimiterState
// =============================================================================

/// Quotas shared by every clone of the layer.
#[derive(Debug)]
pub struct RateLimiterState {
    config: RateLimitConfig,
    global: Quota,
    per_client: Quota,
    global_tat: Mutex<Instant>,
    clients: DashMap<IpAddr, Instant>,
}

impl RateLimiterState {
    /// Fresh quotas for `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            global: Quota::new(config.requests_per_second, config.burst_size),
            per_client: Quota::new(config.per_ip_requests_per_second, config.per_ip_burst_size),
            global_tat: Mutex::new(Instant::now()),
            clients: DashMap::new(),
            config,
        }
    }

    /// Checks a request from `client_ip` arriving now.
    pub fn check(&self, client_ip: Option<IpAddr>) -> RateLimitResult {
        self.check_at(client_ip, Instant::now())
    }

    /// Checks a request from `client_ip` arriving at `now`.
    pub fn check_at(&self, client_ip: Option<IpAddr>, now: Instant) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed;
        }

        if let Err(wait) = self.global.admit(&mut self.global_tat.lock(), now) {
            return RateLimitResult::Limited {
                retry_after: whole_secs(wait),
                reason: "global limit exceeded".to_string(),
            };
        }

        let Some(ip) = client_ip.filter(|_| self.config.per_ip) else {
            return RateLimitResult::Allowed;
        };
        if self.clients.len() >= self.config.max_tracked_clients {
            self.evict_idle(now);
        }
        let mut tat = self.clients.entry(ip).or_insert(now);
        match self.per_client.admit(&mut tat, now) {
            Ok(()) => RateLimitResult::Allowed,
            Err(wait) => RateLimitResult::Limited {
                retry_after: whole_secs(wait),
                reason: format!("limit exceeded for {ip}"),
            },
        }
    }

    /// Forgets addresses whose quota has been fully restored for at least
    /// the idle timeout. Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.clients.len();
        let idle = self.config.idle_timeout;
        self.clients
            .retain(|_, tat| now.saturating_duration_since(*tat) < idle);
        before.saturating_sub(self.clients.len())
    }

    /// Number of addresses with a quota.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Verdict on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Go ahead.
    Allowed,
    /// Over quota.
    Limited {
        /// Whole seconds to wait, at least one.
        retry_after: u64,
        /// Which quota refused.
        reason: String,
    },
}

// =============================================================================
// Layer and Service
// =============================================================================

/// Layer producing [`RateLimitMiddleware`].
#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    state: Arc<RateLimiterState>,
}

impl RateLimitLayer {
    /// Layer with fresh quotas.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(RateLimiterState::new(config)),
        }
    }

    /// Layer that admits everything.
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::disabled())
    }

    /// Quotas behind this layer.
    pub fn state(&self) -> Arc<RateLimiterState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            state: self.state(),
        }
    }
}

/// Answers 429 with `Retry-After` once a quota is spent.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    state: Arc<RateLimiterState>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
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
        let client_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if let RateLimitResult::Limited {
            retry_after,
            reason,
        } = self.state.check(client_ip)
        {
            tracing::debug!(?client_ip, %reason, retry_after, "Request throttled");
            let response = ApiError::rate_limit_exceeded(Some(retry_after)).into_response();
            return Box::pin(async move { Ok(response) });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}
