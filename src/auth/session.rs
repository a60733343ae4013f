//! Session token projection.
//!
//! Two steps bound to the token lifecycle:
//! - `assign`: principal -> token, at sign-in (no principal leaves the token as is).
//! - `materialize`: token -> session view, on every request.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use super::{
    config::AuthConfig,
    principal::Principal,
    token::{IdentityToken, TokenError, TokenSigner},
};

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Per-request identity rebuilt from the token.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub user: SessionUser,
    /// Token expiry, seconds since the Unix epoch.
    pub expires: u64,
}

pub struct SessionProjector {
    signer: TokenSigner,
    max_age_seconds: u64,
    update_age_seconds: u64,
}

impl SessionProjector {
    /// # Errors
    /// Returns an error if the signing secret is empty.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            signer: TokenSigner::new(config.secret())?,
            max_age_seconds: config.session_max_age_seconds(),
            update_age_seconds: config.session_update_age_seconds(),
        })
    }

    #[must_use]
    pub fn max_age_seconds(&self) -> u64 {
        self.max_age_seconds
    }

    /// Write a newly authenticated principal onto the token.
    ///
    /// With a principal the result is a brand-new token, so no field from an
    /// earlier login survives. Without one the existing token is returned
    /// unchanged.
    #[must_use]
    pub fn assign(
        &self,
        token: Option<IdentityToken>,
        principal: Option<&Principal>,
        now: u64,
    ) -> Option<IdentityToken> {
        match principal {
            Some(principal) => Some(IdentityToken::issue(principal, now, self.max_age_seconds)),
            None => token,
        }
    }

    /// Copy the token's identity onto a session view. No token, no session.
    #[must_use]
    pub fn materialize(&self, token: Option<&IdentityToken>) -> Option<SessionView> {
        token.map(|token| SessionView {
            user: SessionUser {
                id: token.id.clone(),
                name: token.name.clone(),
                email: token.email.clone(),
                role: token.role.clone(),
            },
            expires: token.exp,
        })
    }

    /// A token older than the update age gets a new lifetime; identity stays.
    #[must_use]
    pub fn refresh(&self, token: &IdentityToken, now: u64) -> Option<IdentityToken> {
        if now.saturating_sub(token.iat) >= self.update_age_seconds {
            Some(token.renewed(now, self.max_age_seconds))
        } else {
            None
        }
    }

    /// # Errors
    /// Returns an error if the token cannot be signed.
    pub fn encode(&self, token: &IdentityToken) -> Result<String, TokenError> {
        self.signer.sign(token)
    }

    /// Verify a raw token. Missing, malformed, tampered and expired tokens all
    /// decode to `None`.
    #[must_use]
    pub fn decode(&self, raw: Option<&str>) -> Option<IdentityToken> {
        let raw = raw?;
        match self.signer.verify(raw) {
            Ok(token) => Some(token),
            Err(err) => {
                debug!("Ignoring session token: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{account::AccountProjection, principal::OAuthPrincipal, token::unix_now};
    use secrecy::SecretString;

    fn projector() -> Result<SessionProjector> {
        let config = AuthConfig::new(
            "https://coursely.dev".to_string(),
            SecretString::from("test-secret".to_string()),
        )
        .with_session_max_age_seconds(3_600)
        .with_session_update_age_seconds(600);
        SessionProjector::new(&config)
    }

    fn credentials(id: &str, name: &str, role: &str) -> Principal {
        Principal::Credentials(AccountProjection {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            role: role.to_string(),
        })
    }

    #[test]
    fn assign_without_principal_keeps_token() -> Result<()> {
        let projector = projector()?;
        let token = projector.assign(None, Some(&credentials("1", "alice", "admin")), 100);
        let unchanged = projector.assign(token.clone(), None, 500);
        assert_eq!(unchanged, token);
        assert_eq!(projector.assign(None, None, 500), None);
        Ok(())
    }

    #[test]
    fn assign_replaces_every_field_on_new_login() -> Result<()> {
        let projector = projector()?;
        let first = projector.assign(None, Some(&credentials("1", "alice", "admin")), 100);
        let oauth = Principal::OAuth(OAuthPrincipal {
            provider: "github".to_string(),
            id: "99".to_string(),
            name: None,
            email: None,
        });
        let second = projector.assign(first, Some(&oauth), 200);
        let view = projector.materialize(second.as_ref());
        assert_eq!(
            view.map(|view| view.user),
            Some(SessionUser {
                id: "99".to_string(),
                name: None,
                email: None,
                role: None,
            })
        );
        Ok(())
    }

    #[test]
    fn materialize_without_token_is_no_session() -> Result<()> {
        assert_eq!(projector()?.materialize(None), None);
        Ok(())
    }

    #[test]
    fn materialize_is_idempotent() -> Result<()> {
        let projector = projector()?;
        let token = projector.assign(None, Some(&credentials("1", "alice", "admin")), 100);
        let first = projector.materialize(token.as_ref());
        let second = projector.materialize(token.as_ref());
        assert!(first.is_some());
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn login_round_trips_through_signed_token() -> Result<()> {
        let projector = projector()?;
        let principal = credentials("1", "alice", "admin");
        let token = projector
            .assign(None, Some(&principal), unix_now())
            .ok_or_else(|| anyhow::anyhow!("token not issued"))?;
        let raw = projector.encode(&token)?;

        let decoded = projector.decode(Some(&raw));
        let view = projector
            .materialize(decoded.as_ref())
            .ok_or_else(|| anyhow::anyhow!("no session"))?;
        assert_eq!(view.user.id, "1");
        assert_eq!(view.user.name.as_deref(), Some("alice"));
        assert_eq!(view.user.role.as_deref(), Some("admin"));
        assert_eq!(view.user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(view.expires, token.exp);
        Ok(())
    }

    #[test]
    fn decode_ignores_missing_and_invalid_tokens() -> Result<()> {
        let projector = projector()?;
        assert_eq!(projector.decode(None), None);
        assert_eq!(projector.decode(Some("garbage")), None);

        let other = SessionProjector::new(&AuthConfig::new(
            "https://coursely.dev".to_string(),
            SecretString::from("other-secret".to_string()),
        ))?;
        let token = IdentityToken::issue(&credentials("1", "alice", "admin"), unix_now(), 60);
        let raw = other.encode(&token)?;
        assert_eq!(projector.decode(Some(&raw)), None);
        Ok(())
    }

    #[test]
    fn refresh_only_after_update_age() -> Result<()> {
        let projector = projector()?;
        let token = IdentityToken::issue(&credentials("1", "alice", "admin"), 1_000, 3_600);
        assert_eq!(projector.refresh(&token, 1_599), None);

        let renewed = projector
            .refresh(&token, 1_600)
            .ok_or_else(|| anyhow::anyhow!("expected renewal"))?;
        assert_eq!(renewed.iat, 1_600);
        assert_eq!(renewed.exp, 5_200);
        assert_eq!(renewed.id, token.id);
        assert_eq!(renewed.role, token.role);
        Ok(())
    }
}
