// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! File-based audit logger writing JSON Lines.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog};
use super::AuditLogger;

// =============================================================================
// File Audit Logger
// =============================================================================

/// Appends one compact JSON object per line to a file.
///
/// Writes are buffered and flushed after every entry unless `buffered` is
/// enabled, in which case the caller (or shutdown) flushes explicitly.
pub struct FileAuditLogger {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    buffered: bool,
    entries_written: AtomicU64,
}

impl FileAuditLogger {
    /// Opens (or creates) the log file, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            buffered: false,
            entries_written: AtomicU64::new(0),
        })
    }

    /// Keeps entries in the write buffer until [`AuditLogger::flush`] is called.
    pub fn buffered(mut self) -> Self {
        self.buffered = true;
        self
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of entries written since the logger was opened.
    pub fn entries_written(&self) -> u64 {
        self.entries_written.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for FileAuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAuditLogger")
            .field("path", &self.path)
            .field("buffered", &self.buffered)
            .field("entries_written", &self.entries_written())
            .finish()
    }
}

#[async_trait]
impl AuditLogger for FileAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let line = serde_json::to_string(&entry)?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)
            .map_err(|e| AuditError::write_failed_with("append failed", e))?;
        if !self.buffered {
            writer.flush()?;
        }

        self.entries_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::query_not_supported("file"))
    }

    async fn flush(&self) -> AuditResult<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }

    async fn health_check(&self) -> bool {
        self.path.exists()
    }
}
