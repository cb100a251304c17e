// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Accounts, secrets and configuration shared by the integration suites.

use std::net::{IpAddr, Ipv4Addr};

use lms_api::TokenConfig;
use lms_core::{ClientMeta, NewUser, UserRole};

// =============================================================================
// Secrets
// =============================================================================

/// HMAC secret used by every test issuer.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Internal API key shared by split-deployment tests.
pub const TEST_INTERNAL_KEY: &str = "integration-internal-key-0123";

/// Token configuration with the test secret and default lifetimes.
pub fn token_config() -> TokenConfig {
    TokenConfig::new(TEST_SECRET)
}

// =============================================================================
// Accounts
// =============================================================================

/// A fixture account.
#[derive(Debug, Clone, Copy)]
pub struct TestAccount {
    /// Email address.
    pub email: &'static str,
    /// Display name.
    pub display_name: &'static str,
    /// Plaintext password.
    pub password: &'static str,
    /// Role.
    pub role: UserRole,
}

impl TestAccount {
    /// Registration request for this account.
    pub fn new_user(&self) -> NewUser {
        NewUser::new(self.email, self.display_name, self.role, self.password)
    }
}

/// A student.
pub const STUDENT: TestAccount = TestAccount {
    email: "student@example.edu",
    display_name: "Sam Student",
    password: "student-pass-1",
    role: UserRole::Student,
};

/// An instructor.
pub const INSTRUCTOR: TestAccount = TestAccount {
    email: "instructor@example.edu",
    display_name: "Ira Instructor",
    password: "instructor-pass-1",
    role: UserRole::Instructor,
};

/// A platform administrator.
pub const ADMIN: TestAccount = TestAccount {
    email: "admin@example.edu",
    display_name: "Ada Admin",
    password: "admin-pass-1",
    role: UserRole::SystemAdmin,
};

/// Every fixture account.
pub const ALL_ACCOUNTS: [TestAccount; 3] = [STUDENT, INSTRUCTOR, ADMIN];

// =============================================================================
// Clients
// =============================================================================

/// Client metadata for a browser on a private address.
pub fn browser_client() -> ClientMeta {
    ClientMeta::new(
        Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))),
        Some("Mozilla/5.0 (X11; Linux x86_64)".to_string()),
    )
}

// =============================================================================
// Configuration
// =============================================================================

/// An all-in-one YAML configuration with one bootstrap administrator.
///
/// `password_hash` must be an argon2 PHC string.
pub fn all_in_one_yaml(password_hash: &str) -> String {
    format!(
        r#"
service:
  name: lms-auth-test
  role: all
server:
  host: 127.0.0.1
  port: 18080
token:
  secret: "{TEST_SECRET}"
  ttl_secs: 900
security:
  rate_limit:
    enabled: false
  audit:
    enabled: false
bootstrap_users:
  - email: root@example.edu
    display_name: Root
    role: system_admin
    password_hash: "{password_hash}"
"#
    )
}
