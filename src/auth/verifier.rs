//! Credential verification against the account store.
//!
//! Every failure (missing field, unknown email, wrong password, corrupt hash)
//! is the same `Ok(None)`. Only store faults surface as errors.

use anyhow::Result;
use serde::Deserialize;
use std::{fmt, sync::Arc, sync::OnceLock};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{
    account::{AccountProjection, AccountStore},
    password::{hash_password, verify_password_blocking},
};

/// Email/password pair supplied at sign-in. Never persisted.
#[derive(ToSchema, Deserialize, Clone, Default)]
pub struct CredentialInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialInput {
    #[must_use]
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

pub struct CredentialVerifier {
    store: Arc<dyn AccountStore>,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Check the credentials and return the account projection on success.
    ///
    /// # Errors
    /// Returns an error only when the account store lookup itself fails.
    #[instrument(skip_all)]
    pub async fn authorize(&self, input: &CredentialInput) -> Result<Option<AccountProjection>> {
        let (Some(email), Some(password)) = (input.email.as_deref(), input.password.as_deref())
        else {
            debug!("Credentials missing");
            return Ok(None);
        };
        if email.is_empty() || password.is_empty() {
            debug!("Credentials empty");
            return Ok(None);
        }

        let Some(account) = self.store.find_by_email(email).await? else {
            // Unknown emails cost one hash comparison, same as a mismatch.
            if let Some(hash) = dummy_hash() {
                let _ = verify_password_blocking(password.to_string(), hash.to_string()).await;
            }
            debug!("No account for email");
            return Ok(None);
        };

        let (projection, hash) = account.into_parts();
        if verify_password_blocking(password.to_string(), hash).await {
            Ok(Some(projection))
        } else {
            debug!("Password mismatch");
            Ok(None)
        }
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("coursely-dummy-password").ok())
        .as_deref()
}
