// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP request handlers.

mod auth;
mod health;
mod sessions;

pub use auth::{
    change_password, current_user, login, logout, logout_all, refresh, ChangePasswordRequest,
    CurrentUserResponse, LoginRequest, RefreshRequest,
};
pub use health::{health, ready};
pub use sessions::{list_sessions, revoke_session, revoke_user_sessions};
