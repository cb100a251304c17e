// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access token signing and validation.
//!
//! Tokens are HMAC-signed JWTs. Validation is purely cryptographic plus a
//! time check; the session store is never consulted, so a revoked session's
//! access token stays valid until it expires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use lms_core::{AuthError, AuthResult, PermissionSet, SessionId, UserId, UserRole};

use super::Claims;

/// Minimum secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

// =============================================================================
// TokenConfig
// =============================================================================

/// Access token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC secret.
    #[serde(skip_serializing)]
    pub secret: String,
    /// `iss` claim.
    pub issuer: String,
    /// `aud` claim.
    pub audience: String,
    /// Access token lifetime in seconds.
    pub ttl_secs: u64,
    /// Signing algorithm.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "lms-auth".to_string(),
            audience: "lms".to_string(),
            ttl_secs: 900,
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
        }
    }
}

impl TokenConfig {
    /// Creates a configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Sets the access token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Sets the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_secs = leeway.as_secs();
        self
    }

    /// Returns the access token lifetime.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::validation(
                "token.secret",
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::validation(
                "token.algorithm",
                "only HS256, HS384 and HS512 are supported",
            ));
        }
        if self.ttl_secs == 0 {
            return Err(AuthError::validation("token.ttl_secs", "must be positive"));
        }
        if self.issuer.is_empty() {
            return Err(AuthError::validation("token.issuer", "must not be empty"));
        }
        if self.audience.is_empty() {
            return Err(AuthError::validation("token.audience", "must not be empty"));
        }
        Ok(())
    }
}

// =============================================================================
// AccessToken
// =============================================================================

/// A freshly signed access token.
#[derive(Clone)]
pub struct AccessToken {
    /// Encoded JWT.
    pub token: String,
    /// Claims embedded in the token.
    pub claims: Claims,
    /// Expiration time.
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"****")
            .field("claims", &self.claims)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// TokenIssuer
// =============================================================================

/// Signs and validates access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenIssuer {
    /// Creates an issuer from a validated configuration.
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Time claims are checked by hand so the boundary is exact and
        // testable against an injected clock.
        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss", "aud"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Returns the access token lifetime in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.config.ttl_secs
    }

    /// Signs an access token for the given subject.
    pub fn sign(
        &self,
        user_id: UserId,
        role: UserRole,
        permissions: PermissionSet,
        session_id: SessionId,
    ) -> AuthResult<AccessToken> {
        self.sign_at(user_id, role, permissions, session_id, Utc::now())
    }

    /// Signs an access token as if issued at `now`.
    pub fn sign_at(
        &self,
        user_id: UserId,
        role: UserRole,
        permissions: PermissionSet,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> AuthResult<AccessToken> {
        let claims = Claims::new(user_id, role, permissions, session_id, now, self.config.ttl())
            .with_issuer(&self.config.issuer)
            .with_audience(&self.config.audience);

        let token = encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::token_signing(e.to_string()))?;

        let expires_at = claims
            .expires_at()
            .ok_or_else(|| AuthError::token_signing("expiry out of range"))?;

        Ok(AccessToken {
            token,
            claims,
            expires_at,
            expires_in: self.config.ttl_secs,
        })
    }

    /// Validates a token against the current time.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validates a token at `now` (Unix seconds).
    ///
    /// The token is accepted while `nbf - leeway <= now < exp + leeway`.
    pub fn validate_at(&self, token: &str, now: i64) -> AuthResult<Claims> {
        let claims = self.verify_signature(token)?;
        let leeway = i64::try_from(self.config.leeway_secs).unwrap_or(i64::MAX);

        if claims.is_expired_at(now.saturating_sub(leeway)) {
            return Err(AuthError::invalid_token("token has expired"));
        }
        if now.saturating_add(leeway) < claims.nbf {
            return Err(AuthError::invalid_token("token is not yet valid"));
        }
        Ok(claims)
    }

    /// Checks signature, issuer and audience but not the time claims.
    ///
    /// Used by logout so that an expired token can still end its session.
    pub fn verify_signature(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::InvalidSignature => "invalid signature".to_string(),
                    ErrorKind::InvalidIssuer => "invalid issuer".to_string(),
                    ErrorKind::InvalidAudience => "invalid audience".to_string(),
                    ErrorKind::InvalidAlgorithm => "unexpected algorithm".to_string(),
                    ErrorKind::InvalidToken => "malformed token".to_string(),
                    ErrorKind::MissingRequiredClaim(claim) => format!("missing claim '{}'", claim),
                    _ => format!("token validation failed: {}", e),
                };
                AuthError::invalid_token(reason)
            })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("algorithm", &self.config.algorithm)
            .field("ttl_secs", &self.config.ttl_secs)
            .finish()
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match algorithm {
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            _ => "HS256",
        };
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(serde::de::Error::custom(format!(
                "unsupported algorithm '{}', expected HS256, HS384 or HS512",
                s
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::Permission;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig::new(SECRET)).unwrap()
    }

    fn permissions() -> PermissionSet {
        PermissionSet::from_permissions([Permission::CourseRead, Permission::SubmissionWrite])
    }

    #[test]
    fn test_sign_and_validate() {
        let issuer = issuer();
        let user = UserId::new();
        let session = SessionId::new();

        let access = issuer
            .sign(user, UserRole::Student, permissions(), session)
            .unwrap();
        assert_eq!(access.expires_in, 900);

        let claims = issuer.validate(&access.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.session_id().unwrap(), session);
        assert_eq!(claims.role, UserRole::Student);
        assert_eq!(claims.permissions, permissions());
        assert_eq!(claims.iss, "lms-auth");
        assert_eq!(claims.aud, "lms");
    }

    #[test]
    fn test_valid_until_expiry_only() {
        let issuer = issuer();
        let issued = Utc::now();
        let access = issuer
            .sign_at(UserId::new(), UserRole::Student, permissions(), SessionId::new(), issued)
            .unwrap();
        let exp = access.claims.exp;

        assert!(issuer.validate_at(&access.token, issued.timestamp()).is_ok());
        assert!(issuer.validate_at(&access.token, exp - 1).is_ok());
        assert!(matches!(
            issuer.validate_at(&access.token, exp),
            Err(AuthError::InvalidToken { .. })
        ));
        assert!(issuer.validate_at(&access.token, exp + 3600).is_err());
    }

    #[test]
    fn test_leeway_extends_boundary() {
        let issuer =
            TokenIssuer::new(TokenConfig::new(SECRET).with_leeway(Duration::from_secs(30))).unwrap();
        let access = issuer
            .sign(UserId::new(), UserRole::Student, permissions(), SessionId::new())
            .unwrap();
        let exp = access.claims.exp;

        assert!(issuer.validate_at(&access.token, exp + 29).is_ok());
        assert!(issuer.validate_at(&access.token, exp + 30).is_err());
    }

    #[test]
    fn test_not_before() {
        let issuer = issuer();
        let issued = Utc::now();
        let access = issuer
            .sign_at(UserId::new(), UserRole::Student, permissions(), SessionId::new(), issued)
            .unwrap();

        assert!(issuer
            .validate_at(&access.token, issued.timestamp() - 1)
            .is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenIssuer::new(TokenConfig::new(
            "another-secret-key-that-is-long-enough-too",
        ))
        .unwrap();
        let access = issuer()
            .sign(UserId::new(), UserRole::Student, permissions(), SessionId::new())
            .unwrap();

        let err = other.validate(&access.token).unwrap_err();
        assert_eq!(err, AuthError::invalid_token("invalid signature"));
    }

    #[test]
    fn test_wrong_audience() {
        let other =
            TokenIssuer::new(TokenConfig::new(SECRET).with_audience("reporting")).unwrap();
        let access = issuer()
            .sign(UserId::new(), UserRole::Student, permissions(), SessionId::new())
            .unwrap();

        assert_eq!(
            other.validate(&access.token).unwrap_err(),
            AuthError::invalid_token("invalid audience")
        );
    }

    #[test]
    fn test_verify_signature_ignores_expiry() {
        let issuer = issuer();
        let long_ago = Utc::now() - chrono::Duration::hours(2);
        let access = issuer
            .sign_at(UserId::new(), UserRole::Student, permissions(), SessionId::new(), long_ago)
            .unwrap();

        assert!(issuer.validate(&access.token).is_err());
        assert!(issuer.verify_signature(&access.token).is_ok());
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            issuer().validate("not.a.token"),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(TokenConfig::new("short").validate().is_err());
        assert!(TokenConfig::new(SECRET)
            .with_algorithm(Algorithm::RS256)
            .validate()
            .is_err());
        assert!(TokenConfig::new(SECRET)
            .with_ttl(Duration::ZERO)
            .validate()
            .is_err());
        assert!(TokenConfig::new(SECRET)
            .with_algorithm(Algorithm::HS512)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_config_algorithm_serde() {
        let config: TokenConfig =
            serde_json::from_str(r#"{"secret": "x", "algorithm": "hs384"}"#).unwrap();
        assert_eq!(config.algorithm, Algorithm::HS384);
        assert_eq!(config.ttl_secs, 900);

        assert!(serde_json::from_str::<TokenConfig>(r#"{"algorithm": "RS256"}"#).is_err());
    }
}
