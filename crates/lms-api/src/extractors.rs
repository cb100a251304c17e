// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request extractors used by the handlers.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap, Request},
    Json,
};
use serde::de::DeserializeOwned;

use lms_core::ClientMeta;

use crate::auth::AuthContext;
use crate::error::ApiError;

/// Longest user agent kept in session metadata.
const MAX_USER_AGENT: usize = 256;

/// Headers a reverse proxy uses to pass the original client address,
/// most specific first.
const PROXY_HEADERS: [&str; 2] = ["x-forwarded-for", "x-real-ip"];

/// The caller authenticated by [`AuthLayer`](crate::middleware::AuthLayer).
///
/// ```rust,ignore
/// async fn whoami(Auth(ctx): Auth) -> String {
///     ctx.user_id.to_string()
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        match parts.extensions.get::<AuthContext>() {
            Some(ctx) => Ok(Auth(ctx.clone())),
            None => Err(ApiError::unauthorized("Authentication required")),
        }
    }
}

/// A JSON body whose rejection uses the API error envelope.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, ApiError> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(ApiError::bad_request(format!(
                "Invalid JSON: {}",
                rejection.body_text()
            ))),
        }
    }
}

/// Address and user agent of the caller, as stored with a session.
pub struct Client(pub ClientMeta);

impl<S: Send + Sync> FromRequestParts<S> for Client {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT).collect());

        Ok(Client(ClientMeta::new(client_ip(parts), user_agent)))
    }
}

/// Token of an `Authorization: Bearer` header. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Client address: the first proxy header that parses, else the peer.
pub(crate) fn client_ip(parts: &Parts) -> Option<IpAddr> {
    PROXY_HEADERS
        .iter()
        .filter_map(|name| parts.headers.get(*name)?.to_str().ok())
        .find_map(|value| value.split(',').next()?.trim().parse().ok())
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(peer)| peer.ip())
        })
}
