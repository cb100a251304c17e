// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission vocabulary.
//!
//! Permissions are never stored per user. They are derived from a role by the
//! authorization resolver each time a token is issued and carried inside the
//! access token as their string form (`"course:read"`).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single allowed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    // =========================================================================
    // Course Permissions
    // =========================================================================
    /// View courses and course material.
    #[serde(rename = "course:read")]
    CourseRead,
    /// Create and edit courses.
    #[serde(rename = "course:write")]
    CourseWrite,

    // =========================================================================
    // Enrollment Permissions
    // =========================================================================
    /// View enrollments.
    #[serde(rename = "enrollment:read")]
    EnrollmentRead,
    /// Enroll or remove learners.
    #[serde(rename = "enrollment:write")]
    EnrollmentWrite,

    // =========================================================================
    // Assessment Permissions
    // =========================================================================
    /// View submissions.
    #[serde(rename = "submission:read")]
    SubmissionRead,
    /// Hand in submissions.
    #[serde(rename = "submission:write")]
    SubmissionWrite,
    /// View grades.
    #[serde(rename = "grade:read")]
    GradeRead,
    /// Assign grades.
    #[serde(rename = "grade:write")]
    GradeWrite,

    // =========================================================================
    // People Permissions
    // =========================================================================
    /// Read one's own profile.
    #[serde(rename = "profile:read")]
    ProfileRead,
    /// Update one's own profile and password.
    #[serde(rename = "profile:write")]
    ProfileWrite,
    /// Read other users.
    #[serde(rename = "user:read")]
    UserRead,
    /// Manage other users.
    #[serde(rename = "user:write")]
    UserWrite,

    // =========================================================================
    // Institute Permissions
    // =========================================================================
    /// Read institute structure.
    #[serde(rename = "institute:read")]
    InstituteRead,
    /// Manage institute structure.
    #[serde(rename = "institute:write")]
    InstituteWrite,
    /// View reports.
    #[serde(rename = "report:read")]
    ReportRead,

    // =========================================================================
    // Session & System Permissions
    // =========================================================================
    /// List one's own sessions.
    #[serde(rename = "session:read")]
    SessionRead,
    /// Revoke sessions of other users.
    #[serde(rename = "session:admin")]
    SessionAdmin,
    /// Read the audit trail.
    #[serde(rename = "audit:read")]
    AuditRead,
    /// Full system administration.
    #[serde(rename = "system:admin")]
    SystemAdmin,
}

impl Permission {
    /// Wire name, `resource:action`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CourseRead => "course:read",
            Permission::CourseWrite => "course:write",
            Permission::EnrollmentRead => "enrollment:read",
            Permission::EnrollmentWrite => "enrollment:write",
            Permission::SubmissionRead => "submission:read",
            Permission::SubmissionWrite => "submission:write",
            Permission::GradeRead => "grade:read",
            Permission::GradeWrite => "grade:write",
            Permission::ProfileRead => "profile:read",
            Permission::ProfileWrite => "profile:write",
            Permission::UserRead => "user:read",
            Permission::UserWrite => "user:write",
            Permission::InstituteRead => "institute:read",
            Permission::InstituteWrite => "institute:write",
            Permission::ReportRead => "report:read",
            Permission::SessionRead => "session:read",
            Permission::SessionAdmin => "session:admin",
            Permission::AuditRead => "audit:read",
            Permission::SystemAdmin => "system:admin",
        }
    }

    /// Parses a permission from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.as_str() == s)
    }

    /// Every permission, in declaration order.
    pub fn all() -> &'static [Permission] {
        &[
            Permission::CourseRead,
            Permission::CourseWrite,
            Permission::EnrollmentRead,
            Permission::EnrollmentWrite,
            Permission::SubmissionRead,
            Permission::SubmissionWrite,
            Permission::GradeRead,
            Permission::GradeWrite,
            Permission::ProfileRead,
            Permission::ProfileWrite,
            Permission::UserRead,
            Permission::UserWrite,
            Permission::InstituteRead,
            Permission::InstituteWrite,
            Permission::ReportRead,
            Permission::SessionRead,
            Permission::SessionAdmin,
            Permission::AuditRead,
            Permission::SystemAdmin,
        ]
    }

    /// Permissions that act on other people's data or the system itself.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Permission::UserWrite
                | Permission::InstituteWrite
                | Permission::SessionAdmin
                | Permission::SystemAdmin
        )
    }

    /// The resource part of the wire name.
    pub fn category(&self) -> &'static str {
        let s = self.as_str();
        match s.split_once(':') {
            Some((category, _)) => category,
            None => s,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// An ordered set of permissions.
///
/// Ordering is stable so two resolutions of the same role produce identical
/// token claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    /// No permissions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `permissions`, dropping duplicates.
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Builds a set from string names, skipping names that are not recognised.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names.into_iter().filter_map(Permission::parse).collect()
    }

    /// Grants `permission`.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Withdraws `permission`.
    pub fn remove(&mut self, permission: Permission) {
        self.permissions.remove(&permission);
    }

    /// `true` when `permission` is granted.
    pub fn contains(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// `true` when every one of `permissions` is granted.
    pub fn contains_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.permissions.contains(p))
    }

    /// `true` when at least one of `permissions` is granted.
    pub fn contains_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// Number of granted permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// `true` when nothing is granted.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Returns an iterator over the permissions in order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Grants everything `other` grants.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().copied());
    }

    /// Returns the permission names in order.
    pub fn to_names(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self::from_permissions(iter)
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<I: IntoIterator<Item = Permission>>(&mut self, iter: I) {
        self.permissions.extend(iter);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(Permission::CourseRead.as_str(), "course:read");
        assert_eq!(Permission::SessionAdmin.to_string(), "session:admin");
    }

    #[test]
    fn test_permission_parse_covers_all() {
        for permission in Permission::all() {
            assert_eq!(Permission::parse(permission.as_str()), Some(*permission));
        }
        assert_eq!(Permission::parse("device:read"), None);
    }

    #[test]
    fn test_permission_serde_uses_wire_name() {
        let json = serde_json::to_string(&Permission::GradeWrite).unwrap();
        assert_eq!(json, "\"grade:write\"");
    }

    #[test]
    fn test_permission_category() {
        assert_eq!(Permission::SessionAdmin.category(), "session");
        assert!(Permission::SessionAdmin.is_admin());
        assert!(!Permission::CourseRead.is_admin());
    }

    #[test]
    fn test_set_membership() {
        let mut set = PermissionSet::new();
        set.add(Permission::CourseRead);
        set.add(Permission::SubmissionWrite);

        assert!(set.contains(Permission::CourseRead));
        assert!(!set.contains(Permission::SystemAdmin));
        assert!(set.contains_all(&[Permission::CourseRead, Permission::SubmissionWrite]));
        assert!(!set.contains_all(&[Permission::CourseRead, Permission::SystemAdmin]));
        assert!(set.contains_any(&[Permission::SystemAdmin, Permission::CourseRead]));
    }

    #[test]
    fn test_permission_set_is_a_json_array() {
        let set = PermissionSet::from_permissions([Permission::GradeRead, Permission::CourseRead]);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!(["course:read", "grade:read"]));

        let back: PermissionSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_from_names_skips_unknown() {
        let set = PermissionSet::from_names(["course:read", "bogus", "grade:read"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_names(), vec!["course:read", "grade:read"]);
    }
}
