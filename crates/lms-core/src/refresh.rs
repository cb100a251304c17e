// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Opaque refresh token encoding.
//!
//! The refresh token handed to clients is `base64(session_id ":" secret)`.
//! Embedding the session id lets the coordinator find the session without a
//! lookup table keyed by token.

use std::fmt;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::{AuthError, AuthResult};
use crate::types::SessionId;

/// A decoded refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    /// Session the secret belongs to.
    pub session_id: SessionId,
    /// Raw refresh secret.
    pub secret: String,
}

impl RefreshToken {
    /// Creates a refresh token from its parts.
    pub fn new(session_id: SessionId, secret: impl Into<String>) -> Self {
        Self {
            session_id,
            secret: secret.into(),
        }
    }

    /// Encodes the token into its opaque client form.
    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.session_id, self.secret))
    }

    /// Decodes an opaque token.
    ///
    /// Both the standard and URL-safe alphabets are accepted. Anything that
    /// does not decode to `uuid:secret` is rejected with
    /// [`AuthError::SessionExpiredOrRevoked`] so callers learn nothing about
    /// why the token was refused.
    pub fn decode(encoded: &str) -> AuthResult<Self> {
        let encoded = encoded.trim();
        let bytes = STANDARD
            .decode(encoded)
            .or_else(|_| URL_SAFE.decode(encoded))
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
            .map_err(|_| AuthError::SessionExpiredOrRevoked)?;
        let text = String::from_utf8(bytes).map_err(|_| AuthError::SessionExpiredOrRevoked)?;

        let (session_id, secret) = text
            .split_once(':')
            .ok_or(AuthError::SessionExpiredOrRevoked)?;
        if secret.is_empty() {
            return Err(AuthError::SessionExpiredOrRevoked);
        }
        let session_id = session_id
            .parse::<SessionId>()
            .map_err(|_| AuthError::SessionExpiredOrRevoked)?;

        Ok(Self::new(session_id, secret))
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("session_id", &self.session_id)
            .field("secret", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let token = RefreshToken::new(SessionId::new(), "c2VjcmV0LXZhbHVl_-");
        let decoded = RefreshToken::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_encoded_form_is_plain_base64_of_pair() {
        let session_id = SessionId::new();
        let token = RefreshToken::new(session_id, "abc");
        let raw = STANDARD.decode(token.encode()).unwrap();
        assert_eq!(String::from_utf8(raw).unwrap(), format!("{}:abc", session_id));
    }

    #[test]
    fn test_url_safe_alphabet_accepted() {
        let session_id = SessionId::new();
        let encoded = URL_SAFE_NO_PAD.encode(format!("{}:xyz", session_id));
        let decoded = RefreshToken::decode(&encoded).unwrap();
        assert_eq!(decoded.session_id, session_id);
        assert_eq!(decoded.secret, "xyz");
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let cases = [
            "".to_string(),
            "!!!not base64!!!".to_string(),
            STANDARD.encode("no-separator"),
            STANDARD.encode("not-a-uuid:secret"),
            STANDARD.encode(format!("{}:", SessionId::new())),
        ];
        for case in cases {
            assert_eq!(
                RefreshToken::decode(&case).unwrap_err(),
                AuthError::SessionExpiredOrRevoked,
                "case: {case}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let token = RefreshToken::new(SessionId::new(), "top-secret");
        assert!(!format!("{:?}", token).contains("top-secret"));
    }
}
