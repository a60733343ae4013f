use axum::{Json, extract::Extension, response::IntoResponse};
use std::{collections::BTreeMap, sync::Arc};

use super::{state::AuthState, types::ProviderInfo};

#[utoipa::path(
    get,
    path = "/api/auth/providers",
    responses(
        (status = 200, description = "Configured sign-in providers keyed by id", body = BTreeMap<String, ProviderInfo>)
    ),
    tag = "auth"
)]
pub async fn providers(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    Json(configured_providers(&auth_state))
}

pub(super) fn configured_providers(auth_state: &AuthState) -> BTreeMap<String, ProviderInfo> {
    let config = auth_state.config();
    let mut providers = BTreeMap::new();

    providers.insert(
        "credentials".to_string(),
        ProviderInfo {
            id: "credentials".to_string(),
            name: "Credentials".to_string(),
            kind: "credentials".to_string(),
            signin_url: config.url_for(config.signin_path()),
            callback_url: config.url_for("/api/auth/callback/credentials"),
        },
    );

    if let Some(github) = auth_state.github() {
        let id = github.id();
        providers.insert(
            id.to_string(),
            ProviderInfo {
                id: id.to_string(),
                name: github.name().to_string(),
                kind: "oauth".to_string(),
                signin_url: config.url_for(&format!("/api/auth/signin/{id}")),
                callback_url: config.url_for(&format!("/api/auth/callback/{id}")),
            },
        );
    }

    providers
}
