// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-identity
//!
//! Identity store for the LMS authentication services.
//!
//! Owns user records and their argon2 credential hashes and implements
//! [`lms_core::IdentityService`]. Users are never hard-deleted: deactivation
//! sets `deleted_at` and the account can no longer sign in.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lms_core::{IdentityService, NewUser, UserRole};
//! use lms_identity::InMemoryIdentityStore;
//!
//! let store = InMemoryIdentityStore::default();
//! store.register(NewUser::new("ada@example.com", "Ada", UserRole::Student, "s3cret-pass")).await?;
//! let profile = store.validate_credentials("ada@example.com", "s3cret-pass").await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod password;
pub mod store;

pub use password::{hash_password, verify_password, PasswordPolicy};
pub use store::{InMemoryIdentityStore, UserRecord};
