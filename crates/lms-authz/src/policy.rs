// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role-Based Access Control (RBAC) policy.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lms_core::{Permission, PermissionSet, UserId, UserRole};

// =============================================================================
// Default Role Permissions
// =============================================================================

/// Returns the built-in permissions for a role.
///
/// Each role includes everything the role below it has.
pub fn default_permissions(role: UserRole) -> Vec<Permission> {
    let student = [
        Permission::CourseRead,
        Permission::EnrollmentRead,
        Permission::SubmissionRead,
        Permission::SubmissionWrite,
        Permission::ProfileRead,
        Permission::ProfileWrite,
        Permission::SessionRead,
    ];
    let instructor = [
        Permission::CourseWrite,
        Permission::GradeRead,
        Permission::GradeWrite,
        Permission::EnrollmentWrite,
    ];
    let institute_admin = [
        Permission::UserRead,
        Permission::UserWrite,
        Permission::InstituteRead,
        Permission::InstituteWrite,
        Permission::ReportRead,
        Permission::SessionAdmin,
    ];

    match role {
        UserRole::Student => student.to_vec(),
        UserRole::Instructor => student.iter().chain(instructor.iter()).copied().collect(),
        UserRole::InstituteAdmin => student
            .iter()
            .chain(instructor.iter())
            .chain(institute_admin.iter())
            .copied()
            .collect(),
        UserRole::SystemAdmin => Permission::all().to_vec(),
    }
}

// =============================================================================
// Role Override
// =============================================================================

/// Adjustments applied on top of a role's built-in permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleOverride {
    /// Extra permissions granted to the role.
    pub grant: Vec<Permission>,
    /// Permissions removed from the role.
    pub deny: Vec<Permission>,
}

// =============================================================================
// RBAC Policy
// =============================================================================

/// Role-to-permission mapping plus per-user grants.
///
/// Cheap to clone; created at startup and swapped whole on reload.
#[derive(Debug, Clone)]
pub struct RbacPolicy {
    role_permissions: Arc<HashMap<UserRole, PermissionSet>>,
    user_grants: Arc<HashMap<UserId, PermissionSet>>,
}

impl RbacPolicy {
    /// Creates a policy with the built-in role permissions.
    pub fn new() -> Self {
        RbacPolicyBuilder::new().with_default_roles().build()
    }

    /// Creates a policy builder.
    pub fn builder() -> RbacPolicyBuilder {
        RbacPolicyBuilder::new()
    }

    /// Returns the permissions of a role, if the role is defined.
    pub fn role_permissions(&self, role: UserRole) -> Option<&PermissionSet> {
        self.role_permissions.get(&role)
    }

    /// Returns extra permissions granted to a single user.
    pub fn user_grants(&self, user_id: UserId) -> Option<&PermissionSet> {
        self.user_grants.get(&user_id)
    }

    /// Returns `true` if the role has the permission.
    pub fn has_permission(&self, role: UserRole, permission: Permission) -> bool {
        self.role_permissions
            .get(&role)
            .is_some_and(|perms| perms.contains(permission))
    }

    /// Returns the defined roles.
    pub fn roles(&self) -> Vec<UserRole> {
        let mut roles: Vec<UserRole> = self.role_permissions.keys().copied().collect();
        roles.sort();
        roles
    }
}

impl Default for RbacPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RBAC Policy Builder
// =============================================================================

/// Builder for constructing RBAC policies.
#[derive(Debug, Default)]
pub struct RbacPolicyBuilder {
    role_permissions: HashMap<UserRole, PermissionSet>,
    user_grants: HashMap<UserId, PermissionSet>,
}

impl RbacPolicyBuilder {
    /// Creates a new builder with no roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every role with its built-in permissions.
    pub fn with_default_roles(mut self) -> Self {
        for role in UserRole::all() {
            let perms = PermissionSet::from_permissions(default_permissions(*role));
            self.role_permissions.insert(*role, perms);
        }
        self
    }

    /// Replaces a role's permissions.
    pub fn set_role(mut self, role: UserRole, permissions: Vec<Permission>) -> Self {
        self.role_permissions
            .insert(role, PermissionSet::from_permissions(permissions));
        self
    }

    /// Adds permissions to a role.
    pub fn grant(mut self, role: UserRole, permissions: &[Permission]) -> Self {
        self.role_permissions
            .entry(role)
            .or_default()
            .extend(permissions.iter().copied());
        self
    }

    /// Removes permissions from a role.
    pub fn deny(mut self, role: UserRole, permissions: &[Permission]) -> Self {
        if let Some(entry) = self.role_permissions.get_mut(&role) {
            for perm in permissions {
                entry.remove(*perm);
            }
        }
        self
    }

    /// Applies a configured override to a role.
    pub fn apply_override(self, role: UserRole, over: &RoleOverride) -> Self {
        self.grant(role, &over.grant).deny(role, &over.deny)
    }

    /// Grants extra permissions to one user regardless of role.
    pub fn grant_user(mut self, user_id: UserId, permissions: &[Permission]) -> Self {
        self.user_grants
            .entry(user_id)
            .or_default()
            .extend(permissions.iter().copied());
        self
    }

    /// Builds the policy.
    pub fn build(self) -> RbacPolicy {
        RbacPolicy {
            role_permissions: Arc::new(self.role_permissions),
            user_grants: Arc::new(self.user_grants),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
