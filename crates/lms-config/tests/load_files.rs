// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! File loading tests across formats.

use std::collections::HashMap;
use std::io::Write;

use lms_config::{ConfigError, ConfigLoader, LogLevel, ServiceRole};
use lms_core::{Permission, UserRole};
use tempfile::{Builder, NamedTempFile};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn loader() -> ConfigLoader {
    ConfigLoader::new().with_env(HashMap::new())
}

#[test]
fn loads_yaml() {
    let file = write_config(
        ".yaml",
        &format!(
            r#"
service:
  name: auth-eu-1
  role: all
server:
  host: 127.0.0.1
  port: 9000
token:
  secret: "{SECRET}"
  ttl_secs: 600
session:
  max_sessions_per_user: 5
logging:
  level: debug
  format: compact
security:
  audit:
    path: audit/auth.jsonl
"#
        ),
    );

    let config = loader().load(file.path()).unwrap();
    assert_eq!(config.service.name, "auth-eu-1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.token.ttl_secs, 600);
    assert_eq!(config.session.max_sessions_per_user, 5);
    assert_eq!(config.logging.level, LogLevel::Debug);

    // Relative paths resolve against the config file's directory.
    let audit = config.security.audit.path.unwrap();
    assert!(audit.is_absolute());
    assert!(audit.ends_with("audit/auth.jsonl"));
}

#[test]
fn loads_toml_with_overrides_and_users() {
    let file = write_config(
        ".toml",
        &format!(
            r#"
[token]
secret = "{SECRET}"
algorithm = "HS384"

[[authz.overrides]]
role = "instructor"
grant = ["user:read"]
deny = ["course:write"]

[[bootstrap_users]]
email = "root@example.edu"
display_name = "Root"
role = "system_admin"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g"
"#
        ),
    );

    let config = loader().load(file.path()).unwrap();
    assert_eq!(config.token.algorithm, "HS384");

    let overrides = &config.authz.overrides;
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].role, UserRole::Instructor);
    assert_eq!(overrides[0].grant, vec![Permission::UserRead]);
    assert_eq!(overrides[0].deny, vec![Permission::CourseWrite]);

    assert_eq!(config.bootstrap_users.len(), 1);
    assert_eq!(config.bootstrap_users[0].role, UserRole::SystemAdmin);
}

#[test]
fn loads_json_with_placeholders() {
    let mut vars = HashMap::new();
    vars.insert("AUTH_SECRET".to_string(), SECRET.to_string());

    let file = write_config(
        ".json",
        r#"{
            "service": { "role": "session" },
            "server": { "port": ${AUTH_PORT:7070} },
            "token": { "secret": "${AUTH_SECRET}" },
            "security": { "internal_api_key": "${INTERNAL_KEY:internal-key-0123456789}" }
        }"#,
    );

    let config = ConfigLoader::new().with_env(vars).load(file.path()).unwrap();
    assert_eq!(config.service.role, ServiceRole::Session);
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.token.secret.unwrap().expose(), SECRET);
    assert_eq!(
        config.security.internal_api_key.unwrap().expose(),
        "internal-key-0123456789"
    );
}

#[test]
fn rejects_unknown_fields() {
    let file = write_config(
        ".toml",
        &format!("[token]\nsecret = \"{SECRET}\"\nttl = 60\n"),
    );
    let err = loader().load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn reports_missing_file() {
    let err = loader().load("/nonexistent/lms-auth.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn reports_validation_failure() {
    let file = write_config(".toml", "[token]\nsecret = \"too-short\"\n");
    let err = loader().load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
    assert!(err.to_string().contains("token.secret"));
}
