// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Assertion Helpers

use serde_json::Value;

use lms_core::{AuthError, AuthErrorKind};

/// Asserts that `err` is of `expected` kind.
#[track_caller]
pub fn assert_kind(err: &AuthError, expected: AuthErrorKind) {
    assert_eq!(
        err.kind(),
        expected,
        "expected {expected:?}, got {:?}: {err}",
        err.kind()
    );
}

/// Asserts that an HTTP error body carries `code`.
#[track_caller]
pub fn assert_error_code(body: &Value, code: &str) {
    assert_eq!(
        body["error"]["code"].as_str(),
        Some(code),
        "unexpected error body: {body}"
    );
}

/// Returns the string field `key` of a JSON body.
#[track_caller]
pub fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing string field `{key}` in {body}"))
}
