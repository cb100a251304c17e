// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging for authentication events.
//!
//! Every login, refresh, logout and credential change produces an
//! [`AuditLog`] entry. Sinks implement [`AuditLogger`]:
//!
//! - [`FileAuditLogger`]: JSON Lines file, one entry per line
//! - [`InMemoryAuditLogger`]: queryable in-memory store for tests and development
//! - [`NoOpAuditLogger`]: discards everything
//!
//! # Example
//!
//! ```rust,ignore
//! use lms_core::audit::{AuditLogger, AuditLog, InMemoryAuditLogger};
//!
//! let logger = InMemoryAuditLogger::new();
//! logger.log(AuditLog::login(user_id, session_id, &client)).await?;
//! ```

mod error;
mod file_logger;
mod memory_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use file_logger::FileAuditLogger;
pub use memory_logger::InMemoryAuditLogger;
pub use types::{ActionResult, AuditAction, AuditFilter, AuditLog, AuditResource, AuditSeverity};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// A destination for audit records.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Records `entry`.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Entries matching `filter`. Write-only sinks return
    /// [`AuditError::QueryNotSupported`].
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Pushes buffered entries to storage.
    async fn flush(&self) -> AuditResult<()>;

    /// Sink name shown in readiness output.
    fn name(&self) -> &str {
        "audit"
    }

    /// Readiness of the sink.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// Sink used when auditing is switched off.
#[derive(Debug, Default, Clone)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// The sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_sink_accepts_and_forgets() {
        let sink = NoOpAuditLogger::new();
        sink.log(AuditLog::system_start("0.1.0")).await.unwrap();
        assert!(sink.query(AuditFilter::new()).await.unwrap().is_empty());
        assert!(sink.health_check().await);
        assert_eq!(sink.name(), "noop");
    }
}
