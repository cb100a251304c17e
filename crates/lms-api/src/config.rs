// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Settings for the public listener.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::middleware::RateLimitConfig;

const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);

// =============================================================================
// ApiConfig
// =============================================================================

/// Listener, limits and browser policy of the public API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Address the server binds.
    pub listen: SocketAddr,
    /// Cross-origin policy.
    pub cors: CorsConfig,
    /// Request throttling.
    pub rate_limit: RateLimitConfig,
    /// Requests running longer are answered with 408.
    pub request_timeout: Duration,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout: Duration,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            cors: CorsConfig::any(),
            rate_limit: RateLimitConfig::default(),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ApiConfig {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `listen` instead of `0.0.0.0:8080`.
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// Replaces the cross-origin policy.
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    /// Replaces the throttling settings.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Sets the per-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the shutdown grace period.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Caps request bodies at `bytes`.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsConfig {
    /// Any origin, never with credentials.
    Any {
        /// Preflight cache lifetime.
        max_age: Duration,
    },
    /// An explicit origin list.
    Origins {
        /// Exact origins, e.g. `https://lms.example.edu`.
        origins: Vec<String>,
        /// Whether cookies and authorization headers are allowed.
        credentials: bool,
        /// Preflight cache lifetime.
        max_age: Duration,
    },
}

impl CorsConfig {
    /// Allows every origin with a one hour preflight cache.
    pub fn any() -> Self {
        Self::Any {
            max_age: Duration::from_secs(3600),
        }
    }

    /// Allows only `origins`, with credentials.
    pub fn origins(origins: Vec<String>) -> Self {
        Self::Origins {
            origins,
            credentials: true,
            max_age: Duration::from_secs(3600),
        }
    }

    /// Builds the policy from an origin list where `*` means any.
    pub fn from_list(origins: &[String], credentials: bool, max_age: Duration) -> Self {
        if origins.iter().any(|o| o == "*") {
            Self::Any { max_age }
        } else {
            Self::Origins {
                origins: origins.to_vec(),
                credentials,
                max_age,
            }
        }
    }

    /// Preflight cache lifetime.
    pub fn max_age(&self) -> Duration {
        match self {
            Self::Any { max_age } | Self::Origins { max_age, .. } => *max_age,
        }
    }
}
