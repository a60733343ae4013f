//! GitHub OAuth provider.
//!
//! Flow Overview:
//! 1) Redirect the browser to GitHub's authorize URL with a `state` value.
//! 2) Exchange the returned `code` for an access token.
//! 3) Fetch `/user` (and `/user/emails` when the profile email is private)
//!    and hand back an already-verified [`OAuthPrincipal`].

use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{config::GithubConfig, principal::OAuthPrincipal};

pub const GITHUB_PROVIDER_ID: &str = "github";
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_SCOPE: &str = "read:user user:email";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("token exchange rejected: {0}")]
    Exchange(String),
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// URL the browser is sent to for consent.
    ///
    /// # Errors
    /// Returns an error if the configured authorize URL is invalid.
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, OAuthError>;

    /// Trade an authorization code for a verified principal.
    async fn exchange(&self, code: &str, redirect_uri: &str)
    -> Result<OAuthPrincipal, OAuthError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct GithubUser {
    pub(crate) id: u64,
    pub(crate) login: String,
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct GithubEmail {
    pub(crate) email: String,
    pub(crate) primary: bool,
    pub(crate) verified: bool,
}

#[derive(Debug)]
pub struct GithubProvider {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    authorize_url: String,
    token_url: String,
    api_url: String,
}

impl GithubProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GithubConfig) -> Result<Self, OAuthError> {
        let client = Client::builder().user_agent(crate::APP_USER_AGENT).build()?;
        Ok(Self {
            client,
            client_id: config.client_id().to_string(),
            client_secret: config.client_secret().clone(),
            authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
            api_url: GITHUB_API_URL.to_string(),
        })
    }

    /// Point the provider at other endpoints (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_endpoints(mut self, authorize_url: &str, token_url: &str, api_url: &str) -> Self {
        self.authorize_url = authorize_url.to_string();
        self.token_url = token_url.to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let response: TokenResponse = self
            .client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response {
            TokenResponse {
                access_token: Some(token),
                ..
            } if !token.is_empty() => Ok(token),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(OAuthError::Exchange(
                error_description
                    .or(error)
                    .unwrap_or_else(|| "missing access_token".to_string()),
            )),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<T, OAuthError> {
        let value = self
            .client
            .get(format!("{}{path}", self.api_url))
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn id(&self) -> &'static str {
        GITHUB_PROVIDER_ID
    }

    fn name(&self) -> &'static str {
        "GitHub"
    }

    fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", GITHUB_SCOPE),
                ("state", state),
            ],
        )?;
        Ok(url.to_string())
    }

    #[instrument(skip_all)]
    async fn exchange(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthPrincipal, OAuthError> {
        let access_token = self.access_token(code, redirect_uri).await?;
        let user: GithubUser = self.fetch("/user", &access_token).await?;
        debug!("GitHub user {} ({})", user.login, user.id);

        let emails = if user.email.is_none() {
            self.fetch::<Vec<GithubEmail>>("/user/emails", &access_token)
                .await?
        } else {
            Vec::new()
        };

        Ok(principal_from_profile(user, &emails))
    }
}

/// Fall back to the login when the display name is unset, and to the primary
/// verified address when the profile email is private.
pub(crate) fn principal_from_profile(user: GithubUser, emails: &[GithubEmail]) -> OAuthPrincipal {
    let email = user.email.or_else(|| {
        emails
            .iter()
            .find(|entry| entry.primary && entry.verified)
            .map(|entry| entry.email.clone())
    });
    OAuthPrincipal {
        provider: GITHUB_PROVIDER_ID.to_string(),
        id: user.id.to_string(),
        name: user.name.or(Some(user.login)),
        email,
    }
}
