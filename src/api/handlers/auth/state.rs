//! Shared auth state handed to every handler.

use anyhow::Result;
use std::sync::Arc;

use crate::auth::{
    AccountStore, AuthConfig, CredentialVerifier, GithubProvider, OAuthProvider,
    SessionProjector,
};

pub struct AuthState {
    config: AuthConfig,
    verifier: CredentialVerifier,
    projector: SessionProjector,
    github: Option<Arc<dyn OAuthProvider>>,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn AccountStore>,
        github: Option<Arc<dyn OAuthProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        let projector = SessionProjector::new(&config)?;
        Ok(Self {
            config,
            verifier: CredentialVerifier::new(store),
            projector,
            github,
        })
    }

    /// Build the state, wiring GitHub only when it is configured.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the GitHub client
    /// cannot be built.
    pub fn from_config(config: AuthConfig, store: Arc<dyn AccountStore>) -> Result<Self> {
        let github = match config.github() {
            Some(github) => {
                let provider: Arc<dyn OAuthProvider> = Arc::new(GithubProvider::new(github)?);
                Some(provider)
            }
            None => None,
        };
        Self::new(config, store, github)
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    #[must_use]
    pub fn projector(&self) -> &SessionProjector {
        &self.projector
    }

    #[must_use]
    pub fn github(&self) -> Option<&Arc<dyn OAuthProvider>> {
        self.github.as_ref()
    }
}
