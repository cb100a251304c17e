// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-authz
//!
//! Authorization resolver for the LMS authentication services.
//!
//! Maps `(user, role)` to an effective [`lms_core::PermissionSet`]. Nothing is
//! cached per user: the coordinator calls the resolver every time it signs an
//! access token, so claims always reflect the policy in force at issuance.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod policy;
pub mod resolver;

pub use policy::{default_permissions, RbacPolicy, RbacPolicyBuilder, RoleOverride};
pub use resolver::PolicyResolver;
