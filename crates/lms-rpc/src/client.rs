// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP clients for remote collaborator services.
//!
//! Transport failures (connect, timeout, unreadable responses) surface as
//! [`AuthError::UpstreamUnavailable`]. Error bodies returned by the remote
//! service are rebuilt into the original [`AuthError`] kind.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use lms_core::{
    AuthError, AuthResult, AuthorizationService, ClientMeta, IdentityService, IssuedSession,
    NewUser, PermissionSet, SessionId, SessionInfo, SessionService, UserId, UserProfile, UserRole,
};

use crate::wire::{
    CreateSessionRequest, ErrorBody, ListSessionsQuery, RefreshSessionRequest, ResolveRequest,
    ResolveResponse, RevokeAllRequest, RevokeAllResponse, UpdatePasswordRequest,
    ValidateCredentialsRequest, INTERNAL_KEY_HEADER,
};

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for a remote service.
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Base URL, e.g. `http://identity:8081`.
    pub base_url: String,
    /// Total request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Shared internal key sent in `x-internal-key`.
    pub api_key: Option<String>,
}

impl RpcClientConfig {
    /// Creates a configuration with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            api_key: None,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the internal key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

// =============================================================================
// Shared Client
// =============================================================================

#[derive(Debug, Clone)]
struct RpcClient {
    service: &'static str,
    base: Url,
    http: reqwest::Client,
    api_key: Option<String>,
}

impl RpcClient {
    fn new(service: &'static str, config: &RpcClientConfig) -> AuthResult<Self> {
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base = Url::parse(&base).map_err(|e| {
            AuthError::validation(format!("{}.base_url", service), e.to_string())
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            service,
            base,
            http,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> AuthResult<RequestBuilder> {
        let url = self
            .base
            .join(path)
            .map_err(|e| AuthError::internal(format!("invalid path '{}': {}", path, e)))?;

        let mut builder = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header(INTERNAL_KEY_HEADER, key);
        }
        Ok(builder)
    }

    async fn execute(&self, builder: RequestBuilder) -> AuthResult<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(service = self.service, error = %e, "Upstream call failed");
            AuthError::upstream(self.service, e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => {
                debug!(service = self.service, kind = %body.kind, "Upstream returned error");
                Err(match AuthError::from(body) {
                    AuthError::UpstreamUnavailable { message, .. } => {
                        AuthError::upstream(self.service, message)
                    }
                    other => other,
                })
            }
            Err(_) => Err(AuthError::upstream(
                self.service,
                format!("HTTP {}", status),
            )),
        }
    }

    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AuthResult<T> {
        self.execute(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| AuthError::upstream(self.service, format!("invalid response: {}", e)))
    }

    async fn call_empty(&self, builder: RequestBuilder) -> AuthResult<()> {
        self.execute(builder).await.map(|_| ())
    }

    async fn health(&self) -> bool {
        match self.request(Method::GET, "internal/health") {
            Ok(builder) => matches!(builder.send().await, Ok(r) if r.status().is_success()),
            Err(_) => false,
        }
    }
}

// =============================================================================
// Identity Client
// =============================================================================

/// [`IdentityService`] backed by a remote identity service.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    inner: RpcClient,
}

impl HttpIdentityClient {
    /// Creates a client.
    pub fn new(config: &RpcClientConfig) -> AuthResult<Self> {
        Ok(Self {
            inner: RpcClient::new("identity", config)?,
        })
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    async fn validate_credentials(&self, email: &str, password: &str) -> AuthResult<UserProfile> {
        let body = ValidateCredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let builder = self
            .inner
            .request(Method::POST, "internal/identity/validate")?
            .json(&body);
        self.inner.call(builder).await
    }

    async fn get_profile(&self, user_id: UserId) -> AuthResult<UserProfile> {
        let builder = self
            .inner
            .request(Method::GET, &format!("internal/identity/users/{}", user_id))?;
        self.inner.call(builder).await
    }

    async fn update_password(
        &self,
        user_id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> AuthResult<()> {
        let body = UpdatePasswordRequest {
            current_password: current_password.map(str::to_string),
            new_password: new_password.to_string(),
        };
        let builder = self
            .inner
            .request(
                Method::PUT,
                &format!("internal/identity/users/{}/password", user_id),
            )?
            .json(&body);
        self.inner.call_empty(builder).await
    }

    async fn register(&self, user: NewUser) -> AuthResult<UserProfile> {
        let builder = self
            .inner
            .request(Method::POST, "internal/identity/users")?
            .json(&user);
        self.inner.call(builder).await
    }

    async fn deactivate(&self, user_id: UserId) -> AuthResult<()> {
        let builder = self
            .inner
            .request(Method::DELETE, &format!("internal/identity/users/{}", user_id))?;
        self.inner.call_empty(builder).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health().await
    }
}

// =============================================================================
// Session Client
// =============================================================================

/// [`SessionService`] backed by a remote session service.
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    inner: RpcClient,
}

impl HttpSessionClient {
    /// Creates a client.
    pub fn new(config: &RpcClientConfig) -> AuthResult<Self> {
        Ok(Self {
            inner: RpcClient::new("session", config)?,
        })
    }
}

#[async_trait]
impl SessionService for HttpSessionClient {
    async fn create_session(
        &self,
        user_id: UserId,
        role: UserRole,
        client: ClientMeta,
    ) -> AuthResult<IssuedSession> {
        let body = CreateSessionRequest {
            user_id,
            role,
            client,
        };
        let builder = self
            .inner
            .request(Method::POST, "internal/sessions")?
            .json(&body);
        self.inner.call(builder).await
    }

    async fn refresh_session(
        &self,
        session_id: SessionId,
        secret: &str,
    ) -> AuthResult<IssuedSession> {
        let body = RefreshSessionRequest {
            session_id,
            secret: secret.to_string(),
        };
        let builder = self
            .inner
            .request(Method::POST, "internal/sessions/refresh")?
            .json(&body);
        self.inner.call(builder).await
    }

    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()> {
        let builder = self
            .inner
            .request(Method::POST, &format!("internal/sessions/{}/revoke", session_id))?;
        self.inner.call_empty(builder).await
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<usize> {
        let builder = self
            .inner
            .request(Method::POST, "internal/sessions/revoke-all")?
            .json(&RevokeAllRequest { user_id });
        let response: RevokeAllResponse = self.inner.call(builder).await?;
        Ok(response.revoked)
    }

    async fn list_sessions(&self, user_id: UserId) -> AuthResult<Vec<SessionInfo>> {
        let builder = self
            .inner
            .request(Method::GET, "internal/sessions")?
            .query(&ListSessionsQuery { user_id });
        self.inner.call(builder).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health().await
    }
}

// =============================================================================
// Authorization Client
// =============================================================================

/// [`AuthorizationService`] backed by a remote authorization service.
#[derive(Debug, Clone)]
pub struct HttpAuthzClient {
    inner: RpcClient,
}

impl HttpAuthzClient {
    /// Creates a client.
    pub fn new(config: &RpcClientConfig) -> AuthResult<Self> {
        Ok(Self {
            inner: RpcClient::new("authz", config)?,
        })
    }
}

#[async_trait]
impl AuthorizationService for HttpAuthzClient {
    async fn resolve(&self, user_id: UserId, role: UserRole) -> AuthResult<PermissionSet> {
        let builder = self
            .inner
            .request(Method::POST, "internal/authz/resolve")?
            .json(&ResolveRequest { user_id, role });
        let response: ResolveResponse = self.inner.call(builder).await?;
        Ok(response.permissions)
    }

    async fn health_check(&self) -> bool {
        self.inner.health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = RpcClient::new("identity", &RpcClientConfig::new("http://localhost:8081/"))
            .unwrap();
        assert_eq!(
            client.base.join("internal/health").unwrap().as_str(),
            "http://localhost:8081/internal/health"
        );

        let nested = RpcClient::new("identity", &RpcClientConfig::new("http://gw/identity"))
            .unwrap();
        assert_eq!(
            nested.base.join("internal/health").unwrap().as_str(),
            "http://gw/identity/internal/health"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpAuthzClient::new(&RpcClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, AuthError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_is_upstream_unavailable() {
        let config = RpcClientConfig::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_millis(500))
            .with_connect_timeout(Duration::from_millis(200));
        let client = HttpAuthzClient::new(&config).unwrap();

        let err = client
            .resolve(UserId::new(), UserRole::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UpstreamUnavailable { ref service, .. } if service == "authz"));
        assert!(!client.health_check().await);
    }
}
