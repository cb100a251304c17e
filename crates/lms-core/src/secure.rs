// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Comparison of secret material.

use subtle::ConstantTimeEq;

/// Compares two secrets in time independent of where they differ.
///
/// Inputs of different length compare unequal; the length itself is not
/// treated as secret.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
