// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # lms-config
//!
//! Configuration for the LMS authentication services.
//!
//! ## Features
//!
//! - **Schema**: typed sections with defaults and validation
//! - **Multi-Format Support**: YAML, TOML, and JSON files
//! - **Environment Overrides**: `${VAR:default}` placeholders and `LMS_*` variables
//!
//! ## Quick Start
//!
//! ```no_run
//! use lms_config::load_config;
//!
//! let config = load_config("lms-auth.yaml").unwrap();
//! println!("role: {}", config.service.role);
//! ```
//!
//! ## Configuration Schema
//!
//! - `service` - Instance name and hosted collaborators
//! - `server` - HTTP listener
//! - `token` - Access token signing
//! - `session` - Refresh token lifetimes and limits
//! - `identity` - Password policy
//! - `authz` - Role permission overrides
//! - `upstreams` - Remote collaborators
//! - `security` - Rate limiting, audit, and the internal API key
//! - `logging` - Log level and format
//! - `bootstrap_users` - Accounts created at startup

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader, EnvSource};
pub use schema::{
    AuditSettings, AuthzSettings, BootstrapUser, CorsSettings, IdentitySettings, LmsConfig,
    LogFormat, LogLevel, LoggingConfig, RateLimitSettings, RoleOverrideSettings, SecretValue,
    SecurityConfig, ServerConfig, ServiceConfig, ServiceRole, SessionSettings, TokenSettings,
    UpstreamConfig, UpstreamsConfig,
};
