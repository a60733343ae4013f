//! Authenticated principals and their normalization into token identity.

use super::account::AccountProjection;

/// A user already verified by an external OAuth provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthPrincipal {
    pub provider: String,
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Anything that may sign in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    Credentials(AccountProjection),
    OAuth(OAuthPrincipal),
}

/// Identity fields written into the token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Principal {
    /// OAuth principals carry no role; the field stays empty rather than
    /// defaulting so stale roles cannot survive a provider switch.
    #[must_use]
    pub fn identity(&self) -> Identity {
        match self {
            Self::Credentials(account) => Identity {
                id: account.id.clone(),
                name: Some(account.name.clone()),
                email: Some(account.email.clone()),
                role: Some(account.role.clone()),
            },
            Self::OAuth(user) => Identity {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                role: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_principal_keeps_role() {
        let principal = Principal::Credentials(AccountProjection {
            id: "1".to_string(),
            name: "Alice".to_string(),
            email: "a@b.com".to_string(),
            role: "admin".to_string(),
        });
        assert_eq!(
            principal.identity(),
            Identity {
                id: "1".to_string(),
                name: Some("Alice".to_string()),
                email: Some("a@b.com".to_string()),
                role: Some("admin".to_string()),
            }
        );
    }

    #[test]
    fn oauth_principal_has_no_role() {
        let principal = Principal::OAuth(OAuthPrincipal {
            provider: "github".to_string(),
            id: "583231".to_string(),
            name: None,
            email: Some("octocat@github.com".to_string()),
        });
        let identity = principal.identity();
        assert_eq!(identity.id, "583231");
        assert_eq!(identity.name, None);
        assert_eq!(identity.role, None);
    }
}
