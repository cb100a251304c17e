// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Process shutdown.
//!
//! A SIGTERM, a SIGINT or a call to [`ShutdownCoordinator::trigger`] flips a
//! shared watch channel. The HTTP server and the session sweeper wait on it.

use std::future::Future;

use tokio::sync::watch;
use tracing::{info, warn};

/// Shared shutdown switch. Clones observe the same switch.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    state: watch::Sender<Option<&'static str>>,
}

impl ShutdownCoordinator {
    /// Creates a switch in the running state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    /// Stops the process for `reason`. Later calls keep the first reason.
    pub fn trigger(&self, reason: &'static str) {
        let first = self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if first {
            info!(reason, "Shutting down");
        }
    }

    /// The reason shutdown was triggered, if it was.
    pub fn reason(&self) -> Option<&'static str> {
        *self.state.borrow()
    }

    /// Returns `true` once shutdown was triggered.
    pub fn is_triggered(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves once shutdown is triggered, immediately if it already was.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut state = self.state.subscribe();
        async move {
            // The sender lives in `self`'s clones; an error means all of
            // them are gone and nobody can trigger anymore.
            let _ = state.wait_for(Option::is_some).await;
        }
    }

    /// Triggers shutdown when the process receives SIGTERM or SIGINT.
    pub fn listen_for_signals(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let reason = os_signal().await;
            this.trigger(reason);
        });
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn os_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut term), Ok(mut int)) => tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
        },
        (Err(e), _) | (_, Err(e)) => {
            warn!("Cannot install signal handlers ({e}); only Ctrl+C stops the service");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn os_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    "ctrl-c"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let shutdown = ShutdownCoordinator::new();
        let waiter = tokio::spawn(shutdown.wait());

        assert!(!shutdown.is_triggered());
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger("test");
        });

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shutdown.reason(), Some("test"));
    }

    #[tokio::test]
    async fn test_late_waiter_resolves() {
        let shutdown = ShutdownCoordinator::new();
        shutdown.trigger("first");
        shutdown.trigger("second");

        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .unwrap();
        assert_eq!(shutdown.reason(), Some("first"));
    }
}
