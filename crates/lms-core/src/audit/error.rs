// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Failures of an audit sink.
//!
//! Callers log these and carry on; an audit failure never fails the
//! authentication request that produced the record.

use std::io;

use thiserror::Error;

/// An audit sink failure.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The record could not be persisted.
    #[error("audit write failed: {message}")]
    WriteFailed {
        /// What was being written.
        message: String,
        /// Underlying I/O error, when there is one.
        #[source]
        source: Option<io::Error>,
    },

    /// The sink is write-only.
    #[error("the {sink} audit sink cannot be queried")]
    QueryNotSupported {
        /// Sink name.
        sink: String,
    },

    /// The record could not be encoded.
    #[error("audit record encoding failed: {0}")]
    Encoding(String),

    /// Flushing or opening the sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AuditError {
    /// A write failure without an I/O cause.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
            source: None,
        }
    }

    /// A write failure caused by `source`.
    pub fn write_failed_with(message: impl Into<String>, source: io::Error) -> Self {
        Self::WriteFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    /// `sink` does not support queries.
    pub fn query_not_supported(sink: impl Into<String>) -> Self {
        Self::QueryNotSupported { sink: sink.into() }
    }

    /// Encoding failure.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Returns `true` if writing the same record again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailed { .. } | Self::Io(_))
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Result alias for audit sinks.
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(AuditError::write_failed("disk full").is_retryable());
        assert!(!AuditError::query_not_supported("file").is_retryable());
        assert!(!AuditError::serialization("bad utf-8").is_retryable());
    }

    #[test]
    fn test_display_names_the_sink() {
        let err = AuditError::query_not_supported("tracing");
        assert_eq!(err.to_string(), "the tracing audit sink cannot be queried");
    }
}
