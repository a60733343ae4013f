//! Auth configuration passed in at construction time.

use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub const DEFAULT_SIGNIN_PATH: &str = "/signin";
pub const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_SESSION_UPDATE_AGE_SECONDS: u64 = 24 * 60 * 60;

/// GitHub OAuth application credentials.
#[derive(Clone, Debug)]
pub struct GithubConfig {
    client_id: String,
    client_secret: SecretString,
}

impl GithubConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    secret: SecretString,
    signin_path: String,
    session_max_age_seconds: u64,
    session_update_age_seconds: u64,
    github: Option<GithubConfig>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String, secret: SecretString) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret,
            signin_path: DEFAULT_SIGNIN_PATH.to_string(),
            session_max_age_seconds: DEFAULT_SESSION_MAX_AGE_SECONDS,
            session_update_age_seconds: DEFAULT_SESSION_UPDATE_AGE_SECONDS,
            github: None,
        }
    }

    #[must_use]
    pub fn with_signin_path(mut self, path: String) -> Self {
        self.signin_path = path;
        self
    }

    #[must_use]
    pub fn with_session_max_age_seconds(mut self, seconds: u64) -> Self {
        self.session_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_update_age_seconds(mut self, seconds: u64) -> Self {
        self.session_update_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_github(mut self, github: GithubConfig) -> Self {
        self.github = Some(github);
        self
    }

    /// Reject configurations the server cannot start with.
    ///
    /// # Errors
    /// Returns an error for an empty signing secret, empty GitHub credentials,
    /// a non-absolute sign-in path, a zero session lifetime or an invalid base URL.
    pub fn validate(&self) -> Result<()> {
        if self.secret.expose_secret().trim().is_empty() {
            return Err(anyhow!("auth secret must not be empty"));
        }

        if let Some(github) = &self.github {
            if github.client_id.trim().is_empty()
                || github.client_secret.expose_secret().trim().is_empty()
            {
                return Err(anyhow!("GitHub client id and secret must not be empty"));
            }
        }

        if !self.signin_path.starts_with('/') {
            return Err(anyhow!(
                "sign-in path must start with '/': {}",
                self.signin_path
            ));
        }

        if self.session_max_age_seconds == 0 {
            return Err(anyhow!("session max age must be positive"));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|err| anyhow!("invalid base URL {}: {err}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("base URL must be http or https: {}", self.base_url));
        }

        Ok(())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn signin_path(&self) -> &str {
        &self.signin_path
    }

    #[must_use]
    pub fn session_max_age_seconds(&self) -> u64 {
        self.session_max_age_seconds
    }

    #[must_use]
    pub fn session_update_age_seconds(&self) -> u64 {
        self.session_update_age_seconds
    }

    #[must_use]
    pub fn github(&self) -> Option<&GithubConfig> {
        self.github.as_ref()
    }

    /// Absolute URL under the base URL, e.g. `/api/auth/callback/github`.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://coursely.dev/".to_string(), secret("s3cr3t"));

        assert_eq!(config.base_url(), "https://coursely.dev");
        assert_eq!(config.signin_path(), DEFAULT_SIGNIN_PATH);
        assert_eq!(
            config.session_max_age_seconds(),
            DEFAULT_SESSION_MAX_AGE_SECONDS
        );
        assert_eq!(
            config.session_update_age_seconds(),
            DEFAULT_SESSION_UPDATE_AGE_SECONDS
        );
        assert!(config.github().is_none());
        assert!(config.session_cookie_secure());

        let config = config
            .with_signin_path("/login".to_string())
            .with_session_max_age_seconds(600)
            .with_session_update_age_seconds(60)
            .with_github(GithubConfig::new("client".to_string(), secret("gh")));

        assert_eq!(config.signin_path(), "/login");
        assert_eq!(config.session_max_age_seconds(), 600);
        assert_eq!(config.session_update_age_seconds(), 60);
        assert_eq!(config.github().map(GithubConfig::client_id), Some("client"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_for_joins_base_url() {
        let config = AuthConfig::new("http://localhost:3000".to_string(), secret("x"));
        assert_eq!(
            config.url_for("/api/auth/callback/github"),
            "http://localhost:3000/api/auth/callback/github"
        );
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let config = AuthConfig::new("https://coursely.dev".to_string(), secret("  "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_partial_github_credentials() {
        let config = AuthConfig::new("https://coursely.dev".to_string(), secret("x"))
            .with_github(GithubConfig::new(String::new(), secret("gh")));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_paths_and_urls() {
        let relative = AuthConfig::new("https://coursely.dev".to_string(), secret("x"))
            .with_signin_path("signin".to_string());
        assert!(relative.validate().is_err());

        let zero_age = AuthConfig::new("https://coursely.dev".to_string(), secret("x"))
            .with_session_max_age_seconds(0);
        assert!(zero_age.validate().is_err());

        let bad_url = AuthConfig::new("ftp://coursely.dev".to_string(), secret("x"));
        assert!(bad_url.validate().is_err());

        let not_url = AuthConfig::new("coursely".to_string(), secret("x"));
        assert!(not_url.validate().is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = AuthConfig::new("https://coursely.dev".to_string(), secret("top-secret"))
            .with_github(GithubConfig::new("client".to_string(), secret("gh-secret")));
        let debug = format!("{config:?}");
        assert!(!debug.contains("top-secret"));
        assert!(!debug.contains("gh-secret"));
    }
}
