// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Handler state.

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::coordinator::AuthCoordinator;

/// What every handler and middleware can reach. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Listener settings.
    pub config: Arc<ApiConfig>,
    /// Login, refresh and logout.
    pub coordinator: Arc<AuthCoordinator>,
}

impl AppState {
    /// Wraps `config` and `coordinator` for sharing.
    pub fn new(config: ApiConfig, coordinator: AuthCoordinator) -> Self {
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        }
    }

    /// The coordinator.
    pub fn coordinator(&self) -> &AuthCoordinator {
        &self.coordinator
    }

    /// Issuer that validates bearer tokens. It is the one the coordinator
    /// signs with.
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        self.coordinator.issuer()
    }
}
