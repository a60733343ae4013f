//! Credentials sign-in.
//!
//! Flow Overview: verify the email/password pair, write the account's
//! identity into a fresh signed token, set the session cookie and return the
//! resulting session view.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::{session::start_session, state::AuthState};
use crate::auth::{CredentialInput, Principal, SessionView};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[utoipa::path(
    post,
    path = "/api/auth/callback/credentials",
    request_body = CredentialInput,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = SessionView),
        (status = 401, description = "Invalid credentials, including a missing or malformed body"),
        (status = 500, description = "Account lookup failed")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn credentials(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CredentialInput>>,
) -> impl IntoResponse {
    // A missing or unreadable body is just another failed sign-in.
    let Some(Json(input)) = payload else {
        debug!("Credentials sign-in without a usable body");
        return invalid_credentials();
    };

    debug!("Credentials sign-in attempt");

    let account = match auth_state.verifier().authorize(&input).await {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_credentials(),
        Err(err) => {
            error!("Failed to verify credentials: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response();
        }
    };

    match start_session(&auth_state, &Principal::Credentials(account)) {
        Ok((view, cookie)) => {
            info!("Signed in account {}", view.user.id);
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            (StatusCode::OK, headers, Json(view)).into_response()
        }
        Err(err) => {
            error!("Failed to start session: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}

fn invalid_credentials() -> Response {
    (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()).into_response()
}
