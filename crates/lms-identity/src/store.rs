// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory identity store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use lms_core::{
    normalize_email, AuthError, AuthResult, Credential, IdentityService, NewUser, UserId,
    UserProfile, UserRole,
};

use crate::password::{dummy_verify, hash_password, is_valid_hash, verify_password, PasswordPolicy};

// =============================================================================
// User Record
// =============================================================================

/// A stored user. Records are never removed; deletion is a soft delete.
#[derive(Clone)]
pub struct UserRecord {
    /// User ID.
    pub id: UserId,
    /// Normalized email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Current role.
    pub role: UserRole,
    /// Whether the account may sign in.
    pub active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete time.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Returns `true` if the record was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if the account may sign in.
    pub fn can_sign_in(&self) -> bool {
        self.active && !self.is_deleted()
    }

    /// Returns the public profile.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            active: self.can_sign_in(),
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("active", &self.active)
            .field("deleted_at", &self.deleted_at)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Identity Store
// =============================================================================

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, UserRecord>,
    by_email: HashMap<String, UserId>,
}

/// Identity store keeping users in memory.
///
/// Argon2 work runs on the blocking pool and never while the table lock is
/// held.
#[derive(Clone)]
pub struct InMemoryIdentityStore {
    users: Arc<RwLock<UserTable>>,
    policy: PasswordPolicy,
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new(PasswordPolicy::default())
    }
}

impl InMemoryIdentityStore {
    /// Creates an empty store enforcing `policy` on new passwords.
    pub fn new(policy: PasswordPolicy) -> Self {
        Self {
            users: Arc::new(RwLock::new(UserTable::default())),
            policy,
        }
    }

    /// Returns the password policy.
    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Returns the number of stored records, including soft-deleted ones.
    pub fn len(&self) -> usize {
        self.users.read().by_id.len()
    }

    /// Returns `true` if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.read().by_id.is_empty()
    }

    /// Looks up a record by email.
    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let table = self.users.read();
        let id = table.by_email.get(&normalize_email(email))?;
        table.by_id.get(id).cloned()
    }

    /// Changes a user's role.
    pub fn set_role(&self, user_id: UserId, role: UserRole) -> AuthResult<()> {
        let mut table = self.users.write();
        let record = table
            .by_id
            .get_mut(&user_id)
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| AuthError::user_not_found(user_id))?;
        record.role = role;
        record.updated_at = Utc::now();
        info!(user_id = %user_id, role = %role, "User role changed");
        Ok(())
    }

    /// Enables or disables sign-in without deleting the account.
    pub fn set_active(&self, user_id: UserId, active: bool) -> AuthResult<()> {
        let mut table = self.users.write();
        let record = table
            .by_id
            .get_mut(&user_id)
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| AuthError::user_not_found(user_id))?;
        record.active = active;
        record.updated_at = Utc::now();
        Ok(())
    }

    fn record(&self, user_id: UserId) -> AuthResult<UserRecord> {
        self.users
            .read()
            .by_id
            .get(&user_id)
            .filter(|r| !r.is_deleted())
            .cloned()
            .ok_or_else(|| AuthError::user_not_found(user_id))
    }
}

async fn hash_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::internal(format!("hashing task failed: {}", e)))?
}

async fn verify_blocking(hash: Option<String>, password: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&hash, &password),
        None => {
            dummy_verify(&password);
            false
        }
    })
    .await
    .map_err(|e| AuthError::internal(format!("verification task failed: {}", e)))
}

#[async_trait]
impl IdentityService for InMemoryIdentityStore {
    async fn validate_credentials(&self, email: &str, password: &str) -> AuthResult<UserProfile> {
        let record = self.find_by_email(email);
        let hash = record.as_ref().map(|r| r.password_hash.clone());

        let verified = verify_blocking(hash, password.to_string()).await?;

        match record {
            Some(record) if verified && record.can_sign_in() => {
                debug!(user_id = %record.id, "Credentials verified");
                Ok(record.profile())
            }
            Some(record) if verified => {
                warn!(user_id = %record.id, "Sign-in attempt for inactive account");
                Err(AuthError::InvalidCredentials)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn get_profile(&self, user_id: UserId) -> AuthResult<UserProfile> {
        self.record(user_id).map(|r| r.profile())
    }

    async fn update_password(
        &self,
        user_id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> AuthResult<()> {
        let record = self.record(user_id)?;
        self.policy.check(new_password)?;

        if let Some(current) = current_password {
            let verified =
                verify_blocking(Some(record.password_hash.clone()), current.to_string()).await?;
            if !verified {
                return Err(AuthError::InvalidCredentials);
            }
        }

        let new_hash = hash_blocking(new_password.to_string()).await?;

        let mut table = self.users.write();
        let stored = table
            .by_id
            .get_mut(&user_id)
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| AuthError::user_not_found(user_id))?;
        // A concurrent change since the read wins over this one.
        if stored.password_hash != record.password_hash {
            return Err(AuthError::conflict("password changed concurrently"));
        }
        stored.password_hash = new_hash;
        stored.updated_at = Utc::now();

        info!(user_id = %user_id, "Password updated");
        Ok(())
    }

    async fn register(&self, user: NewUser) -> AuthResult<UserProfile> {
        let email = normalize_email(&user.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::validation("email", "must be a valid email address"));
        }
        if self.users.read().by_email.contains_key(&email) {
            return Err(AuthError::conflict(format!("email '{}' already registered", email)));
        }

        let password_hash = match user.credential {
            Credential::Plain(password) => {
                self.policy.check(&password)?;
                hash_blocking(password).await?
            }
            Credential::Hashed(hash) => {
                if !is_valid_hash(&hash) {
                    return Err(AuthError::validation("password_hash", "not a PHC hash string"));
                }
                hash
            }
        };

        let now = Utc::now();
        let display_name = match user.display_name.trim() {
            "" => email.clone(),
            name => name.to_string(),
        };
        let record = UserRecord {
            id: UserId::new(),
            email: email.clone(),
            display_name,
            password_hash,
            role: user.role,
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let mut table = self.users.write();
        if table.by_email.contains_key(&email) {
            return Err(AuthError::conflict(format!("email '{}' already registered", email)));
        }
        table.by_email.insert(email, record.id);
        table.by_id.insert(record.id, record.clone());

        info!(user_id = %record.id, role = %record.role, "User registered");
        Ok(record.profile())
    }

    async fn deactivate(&self, user_id: UserId) -> AuthResult<()> {
        let mut table = self.users.write();
        let record = table
            .by_id
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::user_not_found(user_id))?;
        if record.is_deleted() {
            return Ok(());
        }
        let now = Utc::now();
        record.active = false;
        record.deleted_at = Some(now);
        record.updated_at = now;

        info!(user_id = %user_id, "User soft-deleted");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
