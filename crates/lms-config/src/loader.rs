// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 2. Parse YAML, TOML or JSON
//! 3. Apply `LMS_*` environment overrides
//! 4. Resolve relative paths against the config file's directory
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! LMS_SERVER_PORT=9090
//! LMS_SERVICE_ROLE=coordinator
//! LMS_TOKEN_SECRET=...
//! LMS_UPSTREAM_SESSION_URL=http://session:8080
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{LmsConfig, LogFormat, LogLevel, SecretValue, UpstreamConfig};

// =============================================================================
// ConfigLoader
// =============================================================================

/// Where environment lookups are served from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use lms_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("lms-auth.yaml").unwrap();
/// println!("listening on {}", config.server.socket_addr());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for resolving relative paths.
    base_path: Option<PathBuf>,

    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve placeholders and overrides.
    resolve_env_vars: bool,

    /// Whether to resolve relative paths.
    resolve_paths: bool,

    /// Environment lookup.
    env: EnvSource,
}

impl ConfigLoader {
    /// Creates a loader with default settings.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: "LMS".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
            env: EnvSource::Process,
        }
    }

    /// Sets the base path for relative path resolution.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Serves environment lookups from a fixed map instead of the process.
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = EnvSource::Fixed(vars);
        self
    }

    /// Loads and validates configuration from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<LmsConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config = self.parse_content(&content, format, path)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if self.resolve_paths {
            resolve_relative_paths(&mut config, &base_path);
        }

        config.validate()?;

        info!(
            role = %config.service.role,
            addr = %config.server.socket_addr(),
            "Configuration loaded successfully"
        );
        debug!(
            bootstrap_users = config.bootstrap_users.len(),
            overrides = config.authz.overrides.len(),
            "Configuration details"
        );

        Ok(config)
    }

    /// Loads and validates configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<LmsConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };
        let mut config = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        if self.resolve_paths {
            if let Some(base) = &self.base_path {
                resolve_relative_paths(&mut config, base);
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<LmsConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    /// Resolves `${VAR_NAME}` and `${VAR_NAME:default}` placeholders.
    ///
    /// Unknown variables without a default are left in place.
    fn resolve_env_placeholders(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' || chars.peek() != Some(&'{') {
                result.push(c);
                continue;
            }
            chars.next();

            let mut inner = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                inner.push(c);
            }

            if !closed {
                result.push_str("${");
                result.push_str(&inner);
                continue;
            }

            let (name, default) = match inner.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (inner.as_str(), None),
            };

            match (self.env.get(name), default) {
                (Some(value), _) => result.push_str(&value),
                (None, Some(default)) => result.push_str(default),
                (None, None) => {
                    warn!("Environment variable '{}' not found", name);
                    result.push_str("${");
                    result.push_str(name);
                    result.push('}');
                }
            }
        }

        result
    }

    fn var(&self, suffix: &str) -> (String, Option<String>) {
        let name = format!("{}_{}", self.env_prefix, suffix);
        let value = self.env.get(&name);
        (name, value)
    }

    fn apply_env_overrides(&self, config: &mut LmsConfig) -> ConfigResult<()> {
        if let (_, Some(value)) = self.var("SERVICE_NAME") {
            config.service.name = value;
        }
        if let (name, Some(value)) = self.var("SERVICE_ROLE") {
            config.service.role = value
                .parse()
                .map_err(|e: String| ConfigError::invalid_env_var(name, e))?;
        }

        if let (name, Some(value)) = self.var("SERVER_HOST") {
            config.server.host = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected an IP address"))?;
        }
        if let (name, Some(value)) = self.var("SERVER_PORT") {
            config.server.port = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected valid port number"))?;
        }

        if let (_, Some(value)) = self.var("TOKEN_SECRET") {
            config.token.secret = Some(SecretValue::new(value));
        }
        if let (name, Some(value)) = self.var("TOKEN_TTL_SECS") {
            config.token.ttl_secs = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected valid number"))?;
        }

        if let (_, Some(value)) = self.var("INTERNAL_API_KEY") {
            config.security.internal_api_key = Some(SecretValue::new(value));
        }
        if let (_, Some(value)) = self.var("RATE_LIMIT_ENABLED") {
            config.security.rate_limit.enabled = parse_bool(&value);
        }
        if let (_, Some(value)) = self.var("AUDIT_PATH") {
            config.security.audit.path = Some(PathBuf::from(value));
        }

        if let (name, Some(value)) = self.var("LOG_LEVEL") {
            config.logging.level = LogLevel::parse(&value)
                .ok_or_else(|| ConfigError::invalid_env_var(name, "unknown log level"))?;
        }
        if let (name, Some(value)) = self.var("LOG_FORMAT") {
            config.logging.format = LogFormat::parse(&value)
                .ok_or_else(|| ConfigError::invalid_env_var(name, "unknown log format"))?;
        }

        for (service, slot) in [
            ("IDENTITY", &mut config.upstreams.identity),
            ("SESSION", &mut config.upstreams.session),
            ("AUTHZ", &mut config.upstreams.authz),
        ] {
            if let (_, Some(url)) = self.var(&format!("UPSTREAM_{service}_URL")) {
                match slot {
                    Some(upstream) => upstream.url = url,
                    None => *slot = Some(UpstreamConfig::new(url)),
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_relative_paths(config: &mut LmsConfig, base_path: &Path) {
    if let Some(path) = &mut config.security.audit.path {
        if path.is_relative() {
            *path = base_path.join(&*path);
        }
    }
}

fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<LmsConfig> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<LmsConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<LmsConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ServiceRole;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn loader(pairs: &[(&str, &str)]) -> ConfigLoader {
        ConfigLoader::new().with_env(env(pairs))
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("a.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_placeholder_resolution() {
        let loader = loader(&[("SECRET_FROM_ENV", "abc")]);
        assert_eq!(
            loader.resolve_env_placeholders("key: ${SECRET_FROM_ENV}"),
            "key: abc"
        );
        assert_eq!(
            loader.resolve_env_placeholders("port: ${MISSING_PORT:8081}"),
            "port: 8081"
        );
        assert_eq!(
            loader.resolve_env_placeholders("x: ${MISSING_NO_DEFAULT}"),
            "x: ${MISSING_NO_DEFAULT}"
        );
        assert_eq!(loader.resolve_env_placeholders("x: ${open"), "x: ${open");
        assert_eq!(loader.resolve_env_placeholders("cost: $5"), "cost: $5");
    }

    #[test]
    fn test_env_overrides() {
        let loader = loader(&[
            ("LMS_TOKEN_SECRET", SECRET),
            ("LMS_SERVER_PORT", "9191"),
            ("LMS_SERVICE_ROLE", "coordinator"),
            ("LMS_UPSTREAM_IDENTITY_URL", "http://identity:8080"),
            ("LMS_UPSTREAM_SESSION_URL", "http://session:8080"),
            ("LMS_UPSTREAM_AUTHZ_URL", "http://authz:8080"),
            ("LMS_LOG_FORMAT", "json"),
        ]);

        let config = loader.load_from_str("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.service.role, ServiceRole::Coordinator);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.upstreams.session.unwrap().url,
            "http://session:8080"
        );
        assert_eq!(config.token.secret.unwrap().expose(), SECRET);
    }

    #[test]
    fn test_invalid_env_override() {
        let loader = loader(&[("LMS_TOKEN_SECRET", SECRET), ("LMS_SERVER_PORT", "http")]);
        let err = loader.load_from_str("{}", ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_env_vars_disabled() {
        let loader = loader(&[("LMS_TOKEN_SECRET", SECRET)]).with_env_vars(false);
        assert!(loader.load_from_str("{}", ConfigFormat::Json).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("ON"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }
}
