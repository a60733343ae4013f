//! Session endpoints and the cookie/bearer token transport.

use anyhow::{Context, Result};
use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use super::state::AuthState;
use crate::auth::{AuthConfig, Principal, SessionView, token::unix_now};

pub(super) const SESSION_COOKIE_NAME: &str = "coursely.session-token";
pub(super) const OAUTH_STATE_COOKIE_NAME: &str = "coursely.oauth-state";
const OAUTH_STATE_MAX_AGE_SECONDS: u64 = 10 * 60;

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Active session, or `{}` when there is none. Cookie sessions past the update age get a renewed cookie.", body = SessionView)
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let projector = auth_state.projector();

    // Missing or invalid tokens are "no session", never an error.
    let Some((raw, source)) = extract_session_token(&headers) else {
        return (StatusCode::OK, Json(json!({}))).into_response();
    };
    let Some(token) = projector.decode(Some(&raw)) else {
        return (StatusCode::OK, Json(json!({}))).into_response();
    };

    // Only cookie sessions are renewed; bearer callers manage their own token.
    let mut response_headers = HeaderMap::new();
    let renewal = match source {
        TokenSource::Cookie => projector.refresh(&token, unix_now()),
        TokenSource::Bearer => None,
    };
    let token = match renewal {
        Some(renewed) => match projector
            .encode(&renewed)
            .context("sign renewed token")
            .and_then(|raw| {
                session_cookie(auth_state.config(), &raw).context("build session cookie")
            }) {
            Ok(cookie) => {
                response_headers.insert(SET_COOKIE, cookie);
                renewed
            }
            Err(err) => {
                error!("Failed to renew session token: {err:#}");
                token
            }
        },
        None => token,
    };

    match projector.materialize(Some(&token)) {
        Some(view) => (StatusCode::OK, response_headers, Json(view)).into_response(),
        None => (StatusCode::OK, Json(json!({}))).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn signout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut response_headers = HeaderMap::new();
    match clear_cookie(auth_state.config(), SESSION_COOKIE_NAME, "/") {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Sign a fresh token for a just-authenticated principal.
///
/// Returns the session view for the response body and the `Set-Cookie` value.
pub(super) fn start_session(
    auth_state: &AuthState,
    principal: &Principal,
) -> Result<(SessionView, HeaderValue)> {
    let projector = auth_state.projector();
    let token = projector
        .assign(None, Some(principal), unix_now())
        .context("no token issued for principal")?;
    let raw = projector.encode(&token).context("sign session token")?;
    let cookie = session_cookie(auth_state.config(), &raw).context("build session cookie")?;
    let view = projector
        .materialize(Some(&token))
        .context("no session for issued token")?;
    Ok((view, cookie))
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(
        config,
        SESSION_COOKIE_NAME,
        token,
        "/",
        config.session_max_age_seconds(),
    )
}

/// Short-lived cookie holding the OAuth `state` until the provider calls back.
pub(super) fn oauth_state_cookie(
    config: &AuthConfig,
    state: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(
        config,
        OAUTH_STATE_COOKIE_NAME,
        state,
        "/api/auth",
        OAUTH_STATE_MAX_AGE_SECONDS,
    )
}

pub(super) fn clear_cookie(
    config: &AuthConfig,
    name: &str,
    path: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, name, "", path, 0)
}

fn build_cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    path: &str,
    max_age_seconds: u64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path={path}; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    // Only mark cookies secure when the site is served over HTTPS.
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Where a session token was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenSource {
    Bearer,
    Cookie,
}

/// Bearer header first, then the session cookie.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<(String, TokenSource)> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some((token, TokenSource::Bearer));
    }
    read_cookie(headers, SESSION_COOKIE_NAME).map(|token| (token, TokenSource::Cookie))
}

pub(super) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
