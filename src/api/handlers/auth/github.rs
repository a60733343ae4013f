//! GitHub OAuth sign-in endpoints.
//!
//! Flow Overview:
//! 1) `signin` stores a random `state` in a short-lived cookie and redirects to
//!    GitHub.
//! 2) `callback` checks `state` against the cookie, exchanges the code for a
//!    principal, sets the session cookie and redirects home.
//!
//! Every callback failure redirects to the sign-in page with
//! `?error=OAuthCallback`.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{
    session::{
        OAUTH_STATE_COOKIE_NAME, clear_cookie, oauth_state_cookie, read_cookie, start_session,
    },
    state::AuthState,
    types::OAuthCallbackQuery,
    utils::{generate_state_token, tokens_match},
};
use crate::auth::{AuthConfig, Principal, github::GITHUB_PROVIDER_ID};

pub(super) const GITHUB_CALLBACK_PATH: &str = "/api/auth/callback/github";

#[utoipa::path(
    get,
    path = "/api/auth/signin/github",
    responses(
        (status = 303, description = "Redirect to GitHub"),
        (status = 404, description = "GitHub sign-in is not configured")
    ),
    tag = "auth"
)]
pub async fn signin(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let Some(provider) = auth_state.github() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let config = auth_state.config();

    let state = generate_state_token();
    let redirect_uri = config.url_for(GITHUB_CALLBACK_PATH);
    let url = match provider.authorization_url(&redirect_uri, &state) {
        Ok(url) => url,
        Err(err) => {
            error!("Failed to build GitHub authorize URL: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match oauth_state_cookie(config, &state) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build OAuth state cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    (headers, Redirect::to(&url)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/callback/github",
    params(OAuthCallbackQuery),
    responses(
        (status = 303, description = "Signed in, or sent back to the sign-in page with an error"),
        (status = 404, description = "GitHub sign-in is not configured")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn callback(
    headers: HeaderMap,
    query: Query<OAuthCallbackQuery>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(provider) = auth_state.github() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let config = auth_state.config();

    if let Some(error) = &query.error {
        warn!("GitHub returned an error: {error}");
        return callback_error(config);
    }

    let expected_state = read_cookie(&headers, OAUTH_STATE_COOKIE_NAME);
    let (Some(code), Some(state), Some(expected_state)) =
        (query.code.as_deref(), query.state.as_deref(), expected_state)
    else {
        warn!("GitHub callback missing code or state");
        return callback_error(config);
    };
    if !tokens_match(state, &expected_state) {
        warn!("GitHub callback state mismatch");
        return callback_error(config);
    }

    let principal = match provider
        .exchange(code, &config.url_for(GITHUB_CALLBACK_PATH))
        .await
    {
        Ok(principal) => principal,
        Err(err) => {
            error!("GitHub exchange failed: {err}");
            return callback_error(config);
        }
    };

    let (view, session_cookie) = match start_session(&auth_state, &Principal::OAuth(principal)) {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to start session: {err:#}");
            return callback_error(config);
        }
    };
    info!("Signed in {} user {}", GITHUB_PROVIDER_ID, view.user.id);

    let mut response_headers = with_cleared_state(config);
    response_headers.append(SET_COOKIE, session_cookie);
    (response_headers, Redirect::to(&config.url_for("/"))).into_response()
}

fn callback_error(config: &AuthConfig) -> Response {
    let target = format!("{}?error=OAuthCallback", config.signin_path());
    (with_cleared_state(config), Redirect::to(&target)).into_response()
}

fn with_cleared_state(config: &AuthConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match clear_cookie(config, OAUTH_STATE_COOKIE_NAME, "/api/auth") {
        Ok(cookie) => {
            headers.append(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build OAuth state cookie: {err}"),
    }
    headers
}
