// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing and policy.
//!
//! Hashes are argon2id PHC strings (`$argon2id$v=19$...`) with a random
//! 16-byte salt, so the algorithm and parameters travel with the hash.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use lms_core::{AuthError, AuthResult};

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::internal(format!("salt encoding failed: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::internal(format!("password hashing failed: {}", e)))
}

/// Verifies a password against a PHC string. Malformed hashes never verify.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Returns `true` if `hash` parses as a PHC string.
pub fn is_valid_hash(hash: &str) -> bool {
    PasswordHash::new(hash).is_ok()
}

/// Burns roughly the same time as a real verification.
///
/// Used for unknown accounts so response timing does not reveal whether an
/// email is registered.
pub fn dummy_verify(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| hash_password("lms-dummy-password").ok());
    if let Some(hash) = hash {
        let _ = verify_password(hash, password);
    }
}

// =============================================================================
// Password Policy
// =============================================================================

/// Rules a new password must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Maximum length in characters.
    pub max_length: usize,
    /// Require at least one letter and one digit.
    pub require_mixed: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_mixed: false,
        }
    }
}

impl PasswordPolicy {
    /// Checks a candidate password.
    pub fn check(&self, password: &str) -> AuthResult<()> {
        let len = password.chars().count();
        if len < self.min_length {
            return Err(AuthError::validation(
                "password",
                format!("must be at least {} characters", self.min_length),
            ));
        }
        if len > self.max_length {
            return Err(AuthError::validation(
                "password",
                format!("must be at most {} characters", self.max_length),
            ));
        }
        if self.require_mixed {
            let has_letter = password.chars().any(|c| c.is_alphabetic());
            let has_digit = password.chars().any(|c| c.is_ascii_digit());
            if !(has_letter && has_digit) {
                return Err(AuthError::validation(
                    "password",
                    "must contain both letters and digits",
                ));
            }
        }
        Ok(())
    }
}
