// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Turns an [`LmsConfig`] into running services:
//!
//! - Audit sink selection
//! - In-process stores for hosted collaborators, HTTP clients for the rest
//! - Bootstrap account seeding
//! - Expired session sweeper
//! - Public API and internal routes
//! - Graceful shutdown coordination

use std::future::IntoFuture;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use jsonwebtoken::Algorithm;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use lms_api::{
    ApiConfig, ApiServer, AuthCoordinator, CorsConfig, RateLimitConfig, TokenConfig, TokenIssuer,
};
use lms_authz::{PolicyResolver, RbacPolicy, RbacPolicyBuilder, RoleOverride};
use lms_config::{
    AuditSettings, AuthzSettings, BootstrapUser, IdentitySettings, LmsConfig, SessionSettings,
    TokenSettings, UpstreamConfig,
};
use lms_core::audit::{
    AuditError, AuditFilter, AuditLog, AuditLogger, AuditResult, FileAuditLogger, NoOpAuditLogger,
};
use lms_core::{
    AuthErrorKind, AuthorizationService, IdentityService, NewUser, SessionService,
};
use lms_identity::{InMemoryIdentityStore, PasswordPolicy};
use lms_rpc::{HttpAuthzClient, HttpIdentityClient, HttpSessionClient, InternalRouter, RpcClientConfig};
use lms_session::{InMemorySessionStore, SessionStoreConfig};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// AuthRuntime
// =============================================================================

/// Runs the collaborators and API selected by `service.role`.
pub struct AuthRuntime {
    config: Arc<LmsConfig>,
    shutdown: ShutdownCoordinator,
}

impl AuthRuntime {
    /// Creates a runtime. The configuration must already be validated.
    pub fn new(config: LmsConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Uses an externally owned shutdown coordinator.
    pub fn with_shutdown(mut self, shutdown: ShutdownCoordinator) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds every component without binding a socket.
    pub async fn build(&self) -> BinResult<Components> {
        let config = &self.config;
        let role = config.service.role;
        let audit = create_audit_logger(&config.security.audit)?;
        let api_key = config
            .security
            .internal_api_key
            .as_ref()
            .map(|k| k.expose().to_string());

        let mut components = Components {
            identity: None,
            sessions: None,
            authz: None,
            identity_store: None,
            session_store: None,
            audit: audit.clone(),
        };

        if role.hosts_identity() {
            let store = InMemoryIdentityStore::new(password_policy(&config.identity));
            let seeded = seed_bootstrap_users(&store, &config.bootstrap_users).await?;
            if seeded > 0 {
                info!(count = seeded, "Bootstrap accounts registered");
            }
            components.identity = Some(Arc::new(store.clone()));
            components.identity_store = Some(store);
        } else if role.hosts_coordinator() {
            let upstream = require_upstream(&config.upstreams.identity, "identity")?;
            let client = HttpIdentityClient::new(&rpc_config(upstream, api_key.as_deref()))?;
            components.identity = Some(Arc::new(client));
        }

        if role.hosts_session() {
            let store = InMemorySessionStore::new(session_store_config(&config.session))
                .with_audit_logger(audit.clone());
            components.sessions = Some(Arc::new(store.clone()));
            components.session_store = Some(store);
        } else if role.hosts_coordinator() {
            let upstream = require_upstream(&config.upstreams.session, "session")?;
            let client = HttpSessionClient::new(&rpc_config(upstream, api_key.as_deref()))?;
            components.sessions = Some(Arc::new(client));
        }

        if role.hosts_authz() {
            let resolver = PolicyResolver::new(rbac_policy(&config.authz));
            components.authz = Some(Arc::new(resolver));
        } else if role.hosts_coordinator() {
            let upstream = require_upstream(&config.upstreams.authz, "authz")?;
            let client = HttpAuthzClient::new(&rpc_config(upstream, api_key.as_deref()))?;
            components.authz = Some(Arc::new(client));
        }

        Ok(components)
    }

    /// Builds the HTTP router for this process.
    pub fn router(&self, components: &Components) -> BinResult<Router> {
        let config = &self.config;
        let role = config.service.role;
        let api_key = config
            .security
            .internal_api_key
            .as_ref()
            .map(|k| k.expose().to_string());

        let mut internal = InternalRouter::new().api_key(api_key.clone());
        if role.hosts_identity() {
            if let Some(identity) = &components.identity {
                internal = internal.identity(identity.clone());
            }
        }
        if role.hosts_session() {
            if let Some(sessions) = &components.sessions {
                internal = internal.session(sessions.clone());
            }
        }
        if role.hosts_authz() {
            if let Some(authz) = &components.authz {
                internal = internal.authz(authz.clone());
            }
        }

        if !role.hosts_coordinator() {
            return Ok(internal.build().layer(TraceLayer::new_for_http()));
        }

        let (identity, sessions, authz) = match (
            &components.identity,
            &components.sessions,
            &components.authz,
        ) {
            (Some(i), Some(s), Some(a)) => (i.clone(), s.clone(), a.clone()),
            _ => return Err(BinError::init("coordinator is missing a collaborator")),
        };

        let issuer = Arc::new(TokenIssuer::new(token_config(&config.token)?)?);
        let coordinator = AuthCoordinator::new(identity, sessions, authz, issuer)
            .with_audit_logger(components.audit.clone());

        let mut server = ApiServer::from_parts(api_config(config), coordinator);
        // Internal routes on the public port only when they are key-protected.
        if api_key.is_some() && !internal.is_empty() {
            server = server.with_extra_routes(internal.build());
        }

        Ok(server.router())
    }

    /// Runs until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(
            version = lms_core::VERSION,
            name = %self.config.service.name,
            role = %self.config.service.role,
            "Starting LMS authentication service"
        );

        let components = self.build().await?;
        let router = self.router(&components)?;
        log_audit(&components.audit, AuditLog::system_start(lms_core::VERSION)).await;

        if let Some(store) = components.session_store.clone() {
            spawn_purge_sweeper(store, self.config.session.purge_interval(), &self.shutdown);
        }

        let addr = self.config.server.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BinError::init(format!("Failed to bind {addr}: {e}")))?;

        self.shutdown.listen_for_signals();
        info!(addr = %addr, "LMS authentication service is ready");

        let result = serve(
            router,
            listener,
            &self.shutdown,
            self.config.server.shutdown_timeout(),
        )
        .await;

        log_audit(
            &components.audit,
            AuditLog::system_shutdown(self.shutdown.reason().map(str::to_string)),
        )
        .await;
        if let Err(e) = components.audit.flush().await {
            warn!("Failed to flush audit log: {}", e);
        }

        info!("LMS authentication service shutdown complete");
        result
    }
}

/// Everything a process hosts or talks to.
pub struct Components {
    /// Identity collaborator, local or remote.
    pub identity: Option<Arc<dyn IdentityService>>,
    /// Session collaborator, local or remote.
    pub sessions: Option<Arc<dyn SessionService>>,
    /// Authorization collaborator, local or remote.
    pub authz: Option<Arc<dyn AuthorizationService>>,
    /// The hosted identity store.
    pub identity_store: Option<InMemoryIdentityStore>,
    /// The hosted session store.
    pub session_store: Option<InMemorySessionStore>,
    /// Audit sink.
    pub audit: Arc<dyn AuditLogger>,
}

/// Serves until shutdown, then gives open requests `grace` to finish.
async fn serve(
    router: Router,
    listener: TcpListener,
    shutdown: &ShutdownCoordinator,
    grace: Duration,
) -> BinResult<()> {
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.wait())
    .into_future();

    let stopped = shutdown.wait();
    let deadline = async move {
        stopped.await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result.map_err(|e| BinError::runtime(format!("Server error: {e}"))),
        _ = deadline => {
            warn!(grace_secs = grace.as_secs(), "Requests still open after the grace period, dropping them");
            Ok(())
        }
    }
}

fn require_upstream<'a>(
    upstream: &'a Option<UpstreamConfig>,
    name: &str,
) -> BinResult<&'a UpstreamConfig> {
    upstream
        .as_ref()
        .ok_or_else(|| BinError::config(format!("upstreams.{name} is required")))
}

// =============================================================================
// Config Mapping
// =============================================================================

/// Maps token settings onto the issuer configuration.
pub fn token_config(settings: &TokenSettings) -> BinResult<TokenConfig> {
    let secret = settings
        .secret
        .as_ref()
        .ok_or_else(|| BinError::config("token.secret is required"))?;
    let algorithm = Algorithm::from_str(&settings.algorithm.to_uppercase())
        .map_err(|_| BinError::config(format!("unsupported algorithm '{}'", settings.algorithm)))?;

    Ok(TokenConfig::new(secret.expose())
        .with_issuer(settings.issuer.clone())
        .with_audience(settings.audience.clone())
        .with_ttl(Duration::from_secs(settings.ttl_secs))
        .with_algorithm(algorithm)
        .with_leeway(Duration::from_secs(settings.leeway_secs)))
}

/// Maps server and rate limit settings onto the API configuration.
pub fn api_config(config: &LmsConfig) -> ApiConfig {
    let server = &config.server;
    let limits = &config.security.rate_limit;

    let cors = CorsConfig::from_list(
        &server.cors.allowed_origins,
        server.cors.allow_credentials,
        Duration::from_secs(server.cors.max_age),
    );

    let rate_limit = RateLimitConfig {
        enabled: limits.enabled,
        requests_per_second: limits.requests_per_second,
        burst_size: limits.burst_size,
        per_ip_requests_per_second: limits.per_ip_requests_per_second,
        per_ip_burst_size: limits.per_ip_burst_size,
        ..RateLimitConfig::default()
    };

    ApiConfig::new()
        .with_listen(server.socket_addr())
        .with_cors(cors)
        .with_rate_limit(rate_limit)
        .with_request_timeout(server.request_timeout())
        .with_shutdown_timeout(server.shutdown_timeout())
        .with_max_body_bytes(server.max_body_size)
}

/// Maps session settings onto the store configuration.
pub fn session_store_config(settings: &SessionSettings) -> SessionStoreConfig {
    SessionStoreConfig::default()
        .with_refresh_ttl(settings.refresh_ttl())
        .with_max_lifetime(settings.max_lifetime())
        .with_revoke_on_reuse(settings.revoke_on_reuse)
        .with_reuse_grace(settings.reuse_grace())
        .with_max_sessions_per_user(settings.max_sessions_per_user)
}

/// Maps identity settings onto the password policy.
pub fn password_policy(settings: &IdentitySettings) -> PasswordPolicy {
    PasswordPolicy {
        min_length: settings.min_password_length,
        max_length: settings.max_password_length,
        require_mixed: settings.require_mixed,
    }
}

/// Builds the RBAC policy: built-in roles plus configured overrides.
pub fn rbac_policy(settings: &AuthzSettings) -> RbacPolicy {
    settings
        .overrides
        .iter()
        .fold(
            RbacPolicyBuilder::new().with_default_roles(),
            |builder, o| {
                builder.apply_override(
                    o.role,
                    &RoleOverride {
                        grant: o.grant.clone(),
                        deny: o.deny.clone(),
                    },
                )
            },
        )
        .build()
}

/// Maps an upstream onto an RPC client configuration.
pub fn rpc_config(upstream: &UpstreamConfig, api_key: Option<&str>) -> RpcClientConfig {
    let config = RpcClientConfig::new(upstream.url.clone())
        .with_timeout(Duration::from_secs(upstream.timeout_secs))
        .with_connect_timeout(Duration::from_secs(upstream.connect_timeout_secs));
    match api_key {
        Some(key) => config.with_api_key(key),
        None => config,
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

/// Registers configured accounts. Existing emails are left untouched.
pub async fn seed_bootstrap_users(
    identity: &dyn IdentityService,
    users: &[BootstrapUser],
) -> BinResult<usize> {
    let mut created = 0;
    for user in users {
        let new_user = NewUser::with_hash(
            user.email.clone(),
            user.display_name.clone(),
            user.role,
            user.password_hash.expose().to_string(),
        );
        match identity.register(new_user).await {
            Ok(profile) => {
                debug!(user_id = %profile.id, email = %profile.email, "Bootstrap account created");
                created += 1;
            }
            Err(e) if e.kind() == AuthErrorKind::Conflict => {
                debug!(email = %user.email, "Bootstrap account already exists");
            }
            Err(e) => {
                return Err(BinError::from(e).with_context(format!(
                    "registering bootstrap account '{}'",
                    user.email
                )))
            }
        }
    }
    Ok(created)
}

// =============================================================================
// Background Tasks
// =============================================================================

/// Periodically drops sessions that can no longer be refreshed.
pub fn spawn_purge_sweeper(
    store: InMemorySessionStore,
    interval: Duration,
    shutdown: &ShutdownCoordinator,
) -> tokio::task::JoinHandle<()> {
    let stopped = shutdown.wait();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = store.purge_expired(Utc::now());
                    if purged > 0 {
                        info!(purged, remaining = store.len(), "Purged expired sessions");
                    }
                }
                _ = &mut stopped => break,
            }
        }
        debug!("Session sweeper stopped");
    })
}

// =============================================================================
// Audit
// =============================================================================

/// Creates the audit sink.
pub fn create_audit_logger(settings: &AuditSettings) -> BinResult<Arc<dyn AuditLogger>> {
    if !settings.enabled {
        info!("Audit logging disabled");
        return Ok(Arc::new(NoOpAuditLogger::new()));
    }

    let Some(path) = &settings.path else {
        info!("Audit records go to the log");
        return Ok(Arc::new(TracingAuditLogger));
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BinError::init(format!("Failed to create audit log directory: {e}"))
            })?;
        }
    }

    let logger = FileAuditLogger::new(path)
        .map_err(|e| BinError::init(format!("Failed to create audit logger: {e}")))?;
    let logger = if settings.buffered {
        logger.buffered()
    } else {
        logger
    };

    info!("Audit logging enabled: {}", path.display());
    Ok(Arc::new(logger))
}

async fn log_audit(logger: &Arc<dyn AuditLogger>, entry: AuditLog) {
    if let Err(e) = logger.log(entry).await {
        warn!("Failed to write audit record: {}", e);
    }
}

/// Writes audit records as `audit` target log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let record =
            serde_json::to_string(&entry).map_err(|e| AuditError::serialization(e.to_string()))?;
        info!(target: "audit", action = %entry.action, "{}", record);
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::query_not_supported("tracing"))
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lms_config::{RoleOverrideSettings, SecretValue, ServiceRole};
    use lms_core::{Permission, UserRole};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> LmsConfig {
        let mut config = LmsConfig::default();
        config.token.secret = Some(SecretValue::new(SECRET));
        config.security.audit.enabled = false;
        config
    }

    #[test]
    fn test_token_config_mapping() {
        let mut settings = config().token;
        settings.algorithm = "hs512".to_string();
        settings.ttl_secs = 300;

        let token = token_config(&settings).unwrap();
        assert_eq!(token.algorithm, Algorithm::HS512);
        assert_eq!(token.ttl(), Duration::from_secs(300));

        settings.secret = None;
        assert!(token_config(&settings).is_err());
    }

    #[test]
    fn test_rbac_overrides_applied() {
        let settings = AuthzSettings {
            overrides: vec![RoleOverrideSettings {
                role: UserRole::Student,
                grant: vec![Permission::UserRead],
                deny: vec![],
            }],
        };
        let policy = rbac_policy(&settings);
        assert!(policy.has_permission(UserRole::Student, Permission::UserRead));
        assert!(!rbac_policy(&AuthzSettings::default())
            .has_permission(UserRole::Student, Permission::UserRead));
    }

    #[test]
    fn test_api_config_mapping() {
        let mut config = config();
        config.server.port = 9443;
        config.server.cors.allowed_origins = vec!["https://lms.example.edu".to_string()];
        config.security.rate_limit.enabled = false;

        let api = api_config(&config);
        assert_eq!(api.listen.port(), 9443);
        assert!(matches!(api.cors, CorsConfig::Origins { .. }));
        assert!(!api.rate_limit.enabled);
    }

    #[tokio::test]
    async fn test_build_all_in_one() {
        let mut config = config();
        config.bootstrap_users.push(BootstrapUser {
            email: "admin@example.edu".to_string(),
            display_name: "Admin".to_string(),
            role: UserRole::SystemAdmin,
            password_hash: SecretValue::new(lms_identity::hash_password("admin-pass-1").unwrap()),
        });

        let runtime = AuthRuntime::new(config);
        let components = runtime.build().await.unwrap();
        assert!(components.identity_store.is_some());
        assert!(components.session_store.is_some());
        assert_eq!(components.identity_store.as_ref().unwrap().len(), 1);
        assert!(runtime.router(&components).is_ok());
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let store = InMemoryIdentityStore::default();
        let users = vec![BootstrapUser {
            email: "root@example.edu".to_string(),
            display_name: String::new(),
            role: UserRole::SystemAdmin,
            password_hash: SecretValue::new(lms_identity::hash_password("root-pass-1").unwrap()),
        }];

        assert_eq!(seed_bootstrap_users(&store, &users).await.unwrap(), 1);
        assert_eq!(seed_bootstrap_users(&store, &users).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_build_session_only() {
        let mut config = config();
        config.service.role = ServiceRole::Session;
        config.security.internal_api_key = Some(SecretValue::new("internal-key-0123456789"));

        let runtime = AuthRuntime::new(config);
        let components = runtime.build().await.unwrap();
        assert!(components.identity.is_none());
        assert!(components.session_store.is_some());
        assert!(runtime.router(&components).is_ok());
    }

    #[tokio::test]
    async fn test_coordinator_requires_upstreams() {
        let mut config = config();
        config.service.role = ServiceRole::Coordinator;
        assert!(AuthRuntime::new(config).build().await.is_err());
    }

    #[tokio::test]
    async fn test_audit_logger_selection() {
        let disabled = create_audit_logger(&AuditSettings {
            enabled: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(disabled.name(), "noop");

        let to_log = create_audit_logger(&AuditSettings::default()).unwrap();
        assert_eq!(to_log.name(), "tracing");
        assert!(to_log.log(AuditLog::system_start("test")).await.is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/audit.jsonl");
        let file = create_audit_logger(&AuditSettings {
            enabled: true,
            path: Some(path.clone()),
            buffered: false,
        })
        .unwrap();
        file.log(AuditLog::system_start("test")).await.unwrap();
        file.flush().await.unwrap();
        assert!(path.exists());
    }
}
