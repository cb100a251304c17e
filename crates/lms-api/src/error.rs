// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Errors of the public API and their HTTP rendering.
//!
//! Every error leaves the server as `{"error": {"code", "message"}}`.
//! Failures of the signing key or a collaborator are reported with a generic
//! message; the detail only goes to the log.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lms_core::{AuthError, AuthErrorKind};

/// Result alias for handlers and the server.
pub type ApiResult<T> = Result<T, ApiError>;

const UNAVAILABLE_MESSAGE: &str = "Authentication is temporarily unavailable";

/// A request that cannot be answered successfully.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The authentication flow refused or failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The request itself is at fault. The message is shown to the caller.
    #[error("{code}: {message}")]
    Rejected {
        /// HTTP status, always 4xx.
        status: StatusCode,
        /// Machine-readable code.
        code: &'static str,
        /// Caller-facing explanation.
        message: String,
    },

    /// The caller is over its request budget.
    #[error("rate limit exceeded")]
    TooManyRequests {
        /// Seconds until the next request is admitted.
        retry_after: Option<u64>,
    },

    /// A server-side fault. The message is only logged.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn rejected(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::rejected(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 401 with `message`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::rejected(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// 403 with `message`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::rejected(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// 429, optionally with a `Retry-After` hint.
    pub fn rate_limit_exceeded(retry_after: Option<u64>) -> Self {
        Self::TooManyRequests { retry_after }
    }

    /// 500; `message` is logged, never returned.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status of the response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(err) => public_status(err.kind()),
            Self::Rejected { status, .. } => *status,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code placed in the envelope, e.g. `SESSION_EXPIRED_OR_REVOKED`.
    pub fn error_code(&self) -> String {
        match self {
            Self::Auth(err) => match err.kind() {
                AuthErrorKind::Internal => "INTERNAL_ERROR".to_string(),
                AuthErrorKind::Validation => "VALIDATION_ERROR".to_string(),
                kind => kind.as_str().to_ascii_uppercase(),
            },
            Self::Rejected { code, .. } => (*code).to_string(),
            Self::TooManyRequests { .. } => "RATE_LIMIT_EXCEEDED".to_string(),
            Self::Internal(_) => "INTERNAL_ERROR".to_string(),
        }
    }

    /// Message placed in the envelope.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::SessionExpiredOrRevoked => {
                    "Session expired or revoked, please sign in again".to_string()
                }
                AuthError::InvalidToken { .. } => "Invalid or expired access token".to_string(),
                AuthError::Validation { field, message } => format!("{field}: {message}"),
                AuthError::UserNotFound { .. } => "User not found".to_string(),
                AuthError::SessionNotFound { .. } => "Session not found".to_string(),
                AuthError::Conflict { message } => message.clone(),
                _ => UNAVAILABLE_MESSAGE.to_string(),
            },
            Self::Rejected { message, .. } => message.clone(),
            Self::TooManyRequests {
                retry_after: Some(secs),
            } => format!("Too many requests, retry in {secs} seconds"),
            Self::TooManyRequests { retry_after: None } => "Too many requests".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Public status of an auth failure. Collaborator and key failures are
/// plain 500s here, whatever the internal transport reports.
fn public_status(kind: AuthErrorKind) -> StatusCode {
    match kind {
        AuthErrorKind::InvalidCredentials
        | AuthErrorKind::SessionExpiredOrRevoked
        | AuthErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthErrorKind::Validation => StatusCode::BAD_REQUEST,
        AuthErrorKind::UserNotFound | AuthErrorKind::SessionNotFound => StatusCode::NOT_FOUND,
        AuthErrorKind::Conflict => StatusCode::CONFLICT,
        AuthErrorKind::PermissionResolutionFailure
        | AuthErrorKind::TokenSigningFailure
        | AuthErrorKind::UpstreamUnavailable
        | AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = %code, "Request failed");
        } else {
            tracing::debug!(error = %self, code = %code, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponseBody {
            error: ErrorDetails {
                code,
                message: self.user_message(),
            },
        };
        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();

        if let Self::TooManyRequests {
            retry_after: Some(secs),
        } = self
        {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// `{"error": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// The failure.
    pub error: ErrorDetails,
}

/// Code and message of a failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Stable, upper snake case.
    pub code: String,
    /// Human-readable.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (
                AuthError::SessionExpiredOrRevoked,
                StatusCode::UNAUTHORIZED,
                "SESSION_EXPIRED_OR_REVOKED",
            ),
            (AuthError::invalid_token("x"), StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            (AuthError::validation("email", "empty"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                AuthError::permission_resolution("student", "undefined"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERMISSION_RESOLUTION_FAILURE",
            ),
            (
                AuthError::token_signing("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "TOKEN_SIGNING_FAILURE",
            ),
            (
                AuthError::upstream("identity", "refused"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_UNAVAILABLE",
            ),
            (AuthError::session_not_found("s"), StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            (AuthError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            let err = ApiError::from(err);
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::from(AuthError::upstream("session", "connection refused 10.0.0.3"));
        assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);

        let err = ApiError::internal("pool exhausted");
        assert!(!err.user_message().contains("pool"));
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::from(AuthError::SessionExpiredOrRevoked).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponseBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "SESSION_EXPIRED_OR_REVOKED");
    }

    #[test]
    fn test_rejections() {
        let response = ApiError::rate_limit_exceeded(Some(3)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");

        let err = ApiError::bad_request("Refresh token is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "Refresh token is required");
    }
}
