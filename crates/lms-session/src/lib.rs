// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-session
//!
//! Session store for the LMS authentication services.
//!
//! A session records the user, a role snapshot, client metadata and the
//! SHA-256 of its current refresh secret. Refreshing checks and swaps that
//! hash atomically, so each secret can be exchanged exactly once. Presenting
//! the secret that the last rotation replaced is treated as token theft and,
//! by default, revokes the session.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod secret;
pub mod store;

pub use store::{InMemorySessionStore, RevokeReason, SessionRecord, SessionStoreConfig};
