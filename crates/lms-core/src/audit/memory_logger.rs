// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Queryable in-memory audit trail.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog};
use super::AuditLogger;

/// Keeps entries in memory, oldest first.
///
/// Clones share the same trail, so a test can hand one clone to the
/// coordinator and inspect another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLogger {
    trail: Arc<RwLock<VecDeque<AuditLog>>>,
    /// Oldest entries are dropped beyond this many (0 = unbounded).
    capacity: usize,
}

impl InMemoryAuditLogger {
    /// Creates an unbounded trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a trail that keeps at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            trail: Arc::default(),
            capacity,
        }
    }

    /// Snapshot of every entry.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.trail.read().iter().cloned().collect()
    }

    /// Entries recording `action`.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.select(|entry| entry.action == action)
    }

    /// Entries about `user_id`.
    pub fn entries_for_user(&self, user_id: &str) -> Vec<AuditLog> {
        self.select(|entry| entry.user_id.as_deref() == Some(user_id))
    }

    /// Returns `true` if some entry satisfies `predicate`.
    pub fn has_entry(&self, predicate: impl Fn(&AuditLog) -> bool) -> bool {
        self.trail.read().iter().any(predicate)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.trail.write().clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.trail.read().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.trail.read().is_empty()
    }

    fn select(&self, predicate: impl Fn(&AuditLog) -> bool) -> Vec<AuditLog> {
        self.trail
            .read()
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let mut trail = self.trail.write();
        if self.capacity > 0 && trail.len() == self.capacity {
            trail.pop_front();
        }
        trail.push_back(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let mut found = self.select(|entry| filter.matches(entry));
        if filter.newest_first {
            found.reverse();
        }
        found.truncate(filter.limit.unwrap_or(usize::MAX));
        Ok(found)
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
