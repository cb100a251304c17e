// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission resolution.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use lms_core::{AuthError, AuthResult, AuthorizationService, PermissionSet, UserId, UserRole};

use crate::policy::RbacPolicy;

/// Resolves permissions from the current [`RbacPolicy`].
///
/// The policy can be swapped at runtime. Every call reads the policy that is
/// current at that moment, so a token issued after a reload carries the new
/// permissions.
#[derive(Debug, Clone)]
pub struct PolicyResolver {
    policy: Arc<RwLock<RbacPolicy>>,
    allow_empty: bool,
}

impl PolicyResolver {
    /// Creates a resolver over a policy.
    pub fn new(policy: RbacPolicy) -> Self {
        Self {
            policy: Arc::new(RwLock::new(policy)),
            allow_empty: false,
        }
    }

    /// Allows a role to resolve to an empty permission set.
    ///
    /// By default an empty result is treated as a misconfiguration.
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Replaces the policy.
    pub fn reload(&self, policy: RbacPolicy) {
        *self.policy.write() = policy;
        info!("Authorization policy reloaded");
    }

    /// Returns a snapshot of the current policy.
    pub fn policy(&self) -> RbacPolicy {
        self.policy.read().clone()
    }

    /// Resolves synchronously.
    pub fn resolve_now(&self, user_id: UserId, role: UserRole) -> AuthResult<PermissionSet> {
        let policy = self.policy.read();

        let mut permissions = policy
            .role_permissions(role)
            .cloned()
            .ok_or_else(|| AuthError::permission_resolution(role.as_str(), "role not defined in policy"))?;
        if let Some(grants) = policy.user_grants(user_id) {
            permissions.merge(grants);
        }

        if permissions.is_empty() && !self.allow_empty {
            return Err(AuthError::permission_resolution(
                role.as_str(),
                "role resolves to no permissions",
            ));
        }

        debug!(user_id = %user_id, role = %role, count = permissions.len(), "Permissions resolved");
        Ok(permissions)
    }
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(RbacPolicy::default())
    }
}

#[async_trait]
impl AuthorizationService for PolicyResolver {
    async fn resolve(&self, user_id: UserId, role: UserRole) -> AuthResult<PermissionSet> {
        self.resolve_now(user_id, role)
    }
}
