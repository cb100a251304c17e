// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access tokens and the per-request authentication context.
//!
//! - [`Claims`]: what a token carries
//! - [`TokenIssuer`]: HMAC signing and validation
//! - [`AuthContext`]: the validated caller attached to a request

mod claims;
mod context;
mod token;

pub use claims::Claims;
pub use context::AuthContext;
pub use token::{AccessToken, TokenConfig, TokenIssuer, MIN_SECRET_LEN};
