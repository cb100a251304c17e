// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Config Integration Tests
//!
//! Configuration files on disk turned into a serving router.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use lms_bin::AuthRuntime;
use lms_config::{ConfigLoader, LmsConfig, ServiceRole};
use lms_tests::prelude::*;

const ROOT_PASSWORD: &str = "root-password-1";

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn load(path: &Path) -> LmsConfig {
    ConfigLoader::new()
        .with_env(HashMap::new())
        .load(path)
        .unwrap()
}

async fn router_for(config: LmsConfig) -> axum::Router {
    let runtime = AuthRuntime::new(config);
    let components = runtime.build().await.unwrap();
    runtime.router(&components).unwrap()
}

async fn login_root(router: &axum::Router) -> Value {
    let (status, tokens) = call(
        router,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "root@example.edu", "password": ROOT_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{tokens}");
    tokens
}

#[tokio::test]
async fn test_config_bootstrap_user_can_sign_in() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let hash = lms_identity::hash_password(ROOT_PASSWORD).unwrap();
    let path = write_file(&dir, "lms-auth.yaml", &all_in_one_yaml(&hash));

    let config = load(&path);
    assert_eq!(config.service.role, ServiceRole::All);
    assert_eq!(config.server.port, 18080);

    let router = router_for(config).await;
    let tokens = login_root(&router).await;

    let (status, me) = call(
        &router,
        Method::GET,
        "/auth/me",
        Some(str_field(&tokens, "access_token")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "system_admin");
}

#[tokio::test]
async fn test_config_role_override_reaches_tokens() {
    let dir = TempDir::new().unwrap();
    let hash = lms_identity::hash_password(ROOT_PASSWORD).unwrap();
    let content = format!(
        r#"
[token]
secret = "{TEST_SECRET}"

[security.rate_limit]
enabled = false

[security.audit]
enabled = false

[[authz.overrides]]
role = "system_admin"
deny = ["audit:read"]

[[bootstrap_users]]
email = "root@example.edu"
display_name = "Root"
role = "system_admin"
password_hash = "{hash}"
"#
    );
    let path = write_file(&dir, "lms-auth.toml", &content);

    let router = router_for(load(&path)).await;
    let tokens = login_root(&router).await;

    let (_, me) = call(
        &router,
        Method::GET,
        "/auth/me",
        Some(str_field(&tokens, "access_token")),
        None,
    )
    .await;
    let permissions: Vec<&str> = me["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(permissions.contains(&"system:admin"));
    assert!(!permissions.contains(&"audit:read"));
}

#[tokio::test]
async fn test_config_audit_file_receives_login() {
    let dir = TempDir::new().unwrap();
    let hash = lms_identity::hash_password(ROOT_PASSWORD).unwrap();
    let content = format!(
        r#"
token:
  secret: "{TEST_SECRET}"
security:
  rate_limit:
    enabled: false
  audit:
    enabled: true
    path: audit/auth.jsonl
bootstrap_users:
  - email: root@example.edu
    display_name: Root
    role: system_admin
    password_hash: "{hash}"
"#
    );
    let path = write_file(&dir, "lms-auth.yaml", &content);

    let config = load(&path);
    let audit_path = dir.path().join("audit/auth.jsonl");
    assert_eq!(config.security.audit.path.as_deref(), Some(audit_path.as_path()));

    let router = router_for(config).await;
    login_root(&router).await;

    let written = fs::read_to_string(&audit_path).unwrap();
    let actions: Vec<String> = written
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .filter_map(|entry| entry["action"].as_str().map(str::to_string))
        .collect();
    assert!(actions.iter().any(|a| a == "login"), "{actions:?}");
}

#[tokio::test]
async fn test_config_split_role_without_upstreams_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        r#"
service:
  role: coordinator
token:
  secret: "{TEST_SECRET}"
security:
  internal_api_key: "{TEST_INTERNAL_KEY}"
"#
    );
    let path = write_file(&dir, "lms-auth.yaml", &content);

    let err = ConfigLoader::new()
        .with_env(HashMap::new())
        .load(&path)
        .unwrap_err();
    assert!(err.to_string().contains("upstreams"), "{err}");
}
