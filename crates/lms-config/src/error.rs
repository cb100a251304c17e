// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Errors raised while reading or checking an `LmsConfig`.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file was read but its content is not a valid configuration.
    #[error("{}: {message}", path.display())]
    Parse {
        /// Source file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Content that did not come from a file failed to deserialize.
    #[error("invalid configuration: {message}")]
    Serialization {
        /// Parser message.
        message: String,
    },

    /// A value is present but unacceptable.
    #[error("{field}: {message}")]
    Validation {
        /// Dotted path of the offending key, e.g. `token.secret`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The configuration file does not exist.
    #[error("configuration file {} not found", path.display())]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Requested path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An `LMS_*` override could not be applied.
    #[error("environment variable {name}: {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// What is wrong with its value.
        message: String,
    },

    /// The file extension maps to no known format.
    #[error("unsupported configuration format '{format}' (expected yaml, toml or json)")]
    UnsupportedFormat {
        /// Extension or format name as given.
        format: String,
    },
}

impl ConfigError {
    /// Parse failure in `path`.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Deserialization failure without a file.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Rejected value at `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Missing file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Unreadable file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Bad override value.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Unknown format.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// The dotted key a validation error refers to.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns `true` when the file itself could not be obtained.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::FileNotFound { .. })
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_names_the_key() {
        let err = ConfigError::validation("token.secret", "is required");
        assert_eq!(err.field(), Some("token.secret"));
        assert_eq!(err.to_string(), "token.secret: is required");
    }

    #[test]
    fn test_io_classification() {
        assert!(ConfigError::file_not_found("lms-auth.yaml").is_io_error());
        assert!(!ConfigError::unsupported_format("ini").is_io_error());
        assert_eq!(ConfigError::file_not_found("lms-auth.yaml").field(), None);
    }
}
