// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions.
//!
//! # Schema Structure
//!
//! ```text
//! LmsConfig
//! ├── service: ServiceConfig
//! ├── server: ServerConfig
//! ├── token: TokenSettings
//! ├── session: SessionSettings
//! ├── identity: IdentitySettings
//! ├── authz: AuthzSettings
//! ├── upstreams: UpstreamsConfig
//! ├── security: SecurityConfig
//! ├── logging: LoggingConfig
//! └── bootstrap_users: Vec<BootstrapUser>
//! ```

use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lms_core::{Permission, UserRole};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default public API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default access token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

/// Minimum token signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default refresh token lifetime in seconds (7 days).
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 3600;

/// Default absolute session lifetime in seconds (30 days).
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 30 * 24 * 3600;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration of an authentication service process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LmsConfig {
    /// Process identity and role.
    pub service: ServiceConfig,
    /// Public and internal HTTP server.
    pub server: ServerConfig,
    /// Access token signing.
    pub token: TokenSettings,
    /// Session store.
    pub session: SessionSettings,
    /// Identity store.
    pub identity: IdentitySettings,
    /// Authorization policy.
    pub authz: AuthzSettings,
    /// Remote collaborators.
    pub upstreams: UpstreamsConfig,
    /// Rate limiting, audit and internal credentials.
    pub security: SecurityConfig,
    /// Logging.
    pub logging: LoggingConfig,
    /// Accounts created at startup.
    pub bootstrap_users: Vec<BootstrapUser>,
}

impl LmsConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        if self.service.role.hosts_coordinator() {
            self.token.validate()?;
        }
        self.session.validate()?;
        self.identity.validate()?;
        self.upstreams.validate(self.service.role)?;
        self.security.validate()?;

        if !self.service.role.hosts_coordinator() && self.security.internal_api_key.is_none() {
            return Err(ConfigError::validation(
                "security.internal_api_key",
                format!("required when service.role is '{}'", self.service.role),
            ));
        }

        let mut emails = HashSet::new();
        for (i, user) in self.bootstrap_users.iter().enumerate() {
            user.validate(i)?;
            if !emails.insert(user.email.trim().to_lowercase()) {
                return Err(ConfigError::validation(
                    format!("bootstrap_users[{i}].email"),
                    format!("duplicate email '{}'", user.email),
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Which collaborators a process hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    /// Everything in one process.
    #[default]
    All,
    /// Public API and coordinator; collaborators are remote.
    Coordinator,
    /// Identity store only.
    Identity,
    /// Session store only.
    Session,
    /// Authorization resolver only.
    Authz,
}

impl ServiceRole {
    /// Returns the role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::All => "all",
            ServiceRole::Coordinator => "coordinator",
            ServiceRole::Identity => "identity",
            ServiceRole::Session => "session",
            ServiceRole::Authz => "authz",
        }
    }

    /// Returns `true` if the public API runs in this process.
    pub fn hosts_coordinator(&self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Coordinator)
    }

    /// Returns `true` if the identity store runs in this process.
    pub fn hosts_identity(&self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Identity)
    }

    /// Returns `true` if the session store runs in this process.
    pub fn hosts_session(&self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Session)
    }

    /// Returns `true` if the authorization resolver runs in this process.
    pub fn hosts_authz(&self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Authz)
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(ServiceRole::All),
            "coordinator" => Ok(ServiceRole::Coordinator),
            "identity" => Ok(ServiceRole::Identity),
            "session" => Ok(ServiceRole::Session),
            "authz" => Ok(ServiceRole::Authz),
            other => Err(format!("unknown service role '{other}'")),
        }
    }
}

/// Process identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Instance name used in logs and audit records.
    pub name: String,
    /// Hosted collaborators.
    pub role: ServiceRole,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "lms-auth".to_string(),
            role: ServiceRole::All,
        }
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// CORS settings.
    pub cors: CorsSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            max_body_size: 64 * 1024,
            cors: CorsSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the shutdown grace period.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.max_body_size < 1024 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "must be at least 1024 bytes",
            ));
        }
        Ok(())
    }
}

/// CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsSettings {
    /// Allowed origins. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Whether to allow credentials. Ignored for `*`.
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds.
    pub max_age: u64,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

// =============================================================================
// Token
// =============================================================================

/// Access token signing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenSettings {
    /// HMAC signing secret.
    #[serde(default)]
    pub secret: Option<SecretValue>,

    /// `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Access token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,

    /// HMAC algorithm (HS256, HS384 or HS512).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Clock skew tolerance in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

fn default_issuer() -> String {
    "lms-auth".to_string()
}

fn default_audience() -> String {
    "lms".to_string()
}

fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: default_issuer(),
            audience: default_audience(),
            ttl_secs: default_token_ttl(),
            algorithm: default_algorithm(),
            leeway_secs: 0,
        }
    }
}

impl TokenSettings {
    fn validate(&self) -> ConfigResult<()> {
        match &self.secret {
            None => {
                return Err(ConfigError::validation(
                    "token.secret",
                    "a signing secret is required",
                ))
            }
            Some(secret) if secret.expose().len() < MIN_SECRET_LEN => {
                return Err(ConfigError::validation(
                    "token.secret",
                    format!("must be at least {MIN_SECRET_LEN} bytes"),
                ))
            }
            Some(_) => {}
        }
        if self.ttl_secs == 0 {
            return Err(ConfigError::validation("token.ttl_secs", "cannot be zero"));
        }
        if !matches!(
            self.algorithm.to_uppercase().as_str(),
            "HS256" | "HS384" | "HS512"
        ) {
            return Err(ConfigError::validation(
                "token.algorithm",
                format!("unsupported algorithm '{}'", self.algorithm),
            ));
        }
        if self.issuer.is_empty() || self.audience.is_empty() {
            return Err(ConfigError::validation(
                "token.issuer",
                "issuer and audience cannot be empty",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Session
// =============================================================================

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Refresh token lifetime in seconds, renewed on every rotation.
    pub refresh_ttl_secs: u64,
    /// Absolute session lifetime in seconds (0 = unlimited).
    pub max_lifetime_secs: u64,
    /// Revoke the session when a rotated refresh token is replayed.
    pub revoke_on_reuse: bool,
    /// Seconds after a rotation during which the replaced token is refused
    /// without revoking the session.
    pub reuse_grace_secs: u64,
    /// Maximum active sessions per user (0 = unlimited).
    pub max_sessions_per_user: usize,
    /// Interval of the expired-session sweeper in seconds.
    pub purge_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            max_lifetime_secs: DEFAULT_MAX_LIFETIME_SECS,
            revoke_on_reuse: true,
            reuse_grace_secs: 10,
            max_sessions_per_user: 0,
            purge_interval_secs: 300,
        }
    }
}

impl SessionSettings {
    /// Returns the refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    /// Returns the absolute lifetime, if any.
    pub fn max_lifetime(&self) -> Option<Duration> {
        (self.max_lifetime_secs > 0).then(|| Duration::from_secs(self.max_lifetime_secs))
    }

    /// Returns the reuse grace period.
    pub fn reuse_grace(&self) -> Duration {
        Duration::from_secs(self.reuse_grace_secs)
    }

    /// Returns the sweeper interval.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.refresh_ttl_secs == 0 {
            return Err(ConfigError::validation(
                "session.refresh_ttl_secs",
                "cannot be zero",
            ));
        }
        if self.purge_interval_secs == 0 {
            return Err(ConfigError::validation(
                "session.purge_interval_secs",
                "cannot be zero",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Identity store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentitySettings {
    /// Minimum password length in characters.
    pub min_password_length: usize,
    /// Maximum password length in characters.
    pub max_password_length: usize,
    /// Require letters and digits.
    pub require_mixed: bool,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            max_password_length: 128,
            require_mixed: false,
        }
    }
}

impl IdentitySettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.min_password_length == 0 {
            return Err(ConfigError::validation(
                "identity.min_password_length",
                "cannot be zero",
            ));
        }
        if self.max_password_length < self.min_password_length {
            return Err(ConfigError::validation(
                "identity.max_password_length",
                "must not be below min_password_length",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Authorization
// =============================================================================

/// Authorization policy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthzSettings {
    /// Adjustments on top of the built-in role permissions.
    pub overrides: Vec<RoleOverrideSettings>,
}

/// Permissions granted to or removed from one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleOverrideSettings {
    /// Role the override applies to.
    pub role: UserRole,
    /// Extra permissions.
    #[serde(default)]
    pub grant: Vec<Permission>,
    /// Removed permissions.
    #[serde(default)]
    pub deny: Vec<Permission>,
}

// =============================================================================
// Upstreams
// =============================================================================

/// Locations of collaborators that run in other processes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamsConfig {
    /// Identity service.
    pub identity: Option<UpstreamConfig>,
    /// Session service.
    pub session: Option<UpstreamConfig>,
    /// Authorization service.
    pub authz: Option<UpstreamConfig>,
}

impl UpstreamsConfig {
    fn validate(&self, role: ServiceRole) -> ConfigResult<()> {
        let needed = role == ServiceRole::Coordinator;
        for (name, upstream) in [
            ("identity", &self.identity),
            ("session", &self.session),
            ("authz", &self.authz),
        ] {
            match upstream {
                Some(upstream) => upstream.validate(name)?,
                None if needed => {
                    return Err(ConfigError::validation(
                        format!("upstreams.{name}"),
                        "required when service.role is 'coordinator'",
                    ))
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// A remote collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://session:8080`.
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    #[serde(default = "default_upstream_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_upstream_timeout() -> u64 {
    5
}

fn default_upstream_connect_timeout() -> u64 {
    2
}

impl UpstreamConfig {
    /// Creates an upstream with default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_upstream_timeout(),
            connect_timeout_secs: default_upstream_connect_timeout(),
        }
    }

    fn validate(&self, name: &str) -> ConfigResult<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::validation(
                format!("upstreams.{name}.url"),
                "must start with http:// or https://",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::validation(
                format!("upstreams.{name}.timeout_secs"),
                "cannot be zero",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Security
// =============================================================================

/// Security settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Public API rate limiting.
    pub rate_limit: RateLimitSettings,
    /// Audit trail.
    pub audit: AuditSettings,
    /// Shared key required on `/internal` routes.
    pub internal_api_key: Option<SecretValue>,
}

impl SecurityConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.rate_limit.validate()?;
        if let Some(key) = &self.internal_api_key {
            if key.expose().len() < 16 {
                return Err(ConfigError::validation(
                    "security.internal_api_key",
                    "must be at least 16 bytes",
                ));
            }
        }
        Ok(())
    }
}

/// Rate limiting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitSettings {
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Global requests per second.
    pub requests_per_second: u32,
    /// Global burst size.
    pub burst_size: u32,
    /// Per-address requests per second.
    pub per_ip_requests_per_second: u32,
    /// Per-address burst size.
    pub per_ip_burst_size: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 200,
            burst_size: 400,
            per_ip_requests_per_second: 10,
            per_ip_burst_size: 20,
        }
    }
}

impl RateLimitSettings {
    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.requests_per_second == 0 || self.burst_size == 0 {
            return Err(ConfigError::validation(
                "security.rate_limit",
                "requests_per_second and burst_size must be positive",
            ));
        }
        if self.per_ip_requests_per_second == 0 || self.per_ip_burst_size == 0 {
            return Err(ConfigError::validation(
                "security.rate_limit",
                "per-address limits must be positive",
            ));
        }
        Ok(())
    }
}

/// Audit trail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSettings {
    /// Whether audit records are written.
    pub enabled: bool,
    /// JSON-lines file. When unset, records go to the log.
    pub path: Option<PathBuf>,
    /// Buffer writes instead of flushing each record.
    pub buffered: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            buffered: false,
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,
    /// Log format.
    pub format: LogFormat,
    /// Include targets.
    pub with_target: bool,
    /// Include thread IDs.
    pub with_thread_ids: bool,
    /// Include file and line.
    pub with_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Compact single-line text.
    Compact,
    /// JSON lines.
    Json,
}

impl LogFormat {
    /// Returns the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }

    /// Parses a format name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" | "pretty" => Some(LogFormat::Text),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

// =============================================================================
// Bootstrap Users
// =============================================================================

/// An account registered at startup.
///
/// Passwords are given as argon2 PHC strings, never in plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapUser {
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Role.
    pub role: UserRole,
    /// Argon2 PHC hash.
    pub password_hash: SecretValue,
}

impl BootstrapUser {
    fn validate(&self, index: usize) -> ConfigResult<()> {
        if !self.email.contains('@') {
            return Err(ConfigError::validation(
                format!("bootstrap_users[{index}].email"),
                "not an email address",
            ));
        }
        if !self.password_hash.expose().starts_with("$argon2") {
            return Err(ConfigError::validation(
                format!("bootstrap_users[{index}].password_hash"),
                "must be an argon2 hash (see `lms-auth hash-password`)",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret configuration value. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// =============================================================================
// Tests
// =============================================================================
