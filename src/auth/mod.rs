//! Authentication core: credential checks and session token projection.
//!
//! Flow Overview:
//! 1) A login produces a [`Principal`], either from [`CredentialVerifier`]
//!    (email + password against the account store) or from an OAuth provider.
//! 2) [`SessionProjector::assign`] normalizes the principal into an
//!    [`IdentityToken`], which is signed and handed to the client.
//! 3) Every later request decodes that token and rebuilds a [`SessionView`]
//!    from it. Nothing else is consulted.
//!
//! Nothing in this module reads the process environment; secrets arrive via
//! [`AuthConfig`].

pub mod account;
pub mod config;
pub mod github;
pub mod password;
pub mod principal;
pub mod session;
pub mod token;
pub mod verifier;

pub use account::{Account, AccountProjection, AccountStore, PgAccountStore};
pub use config::{AuthConfig, GithubConfig};
pub use github::{GithubProvider, OAuthError, OAuthProvider};
pub use principal::{Identity, OAuthPrincipal, Principal};
pub use session::{SessionProjector, SessionUser, SessionView};
pub use token::{IdentityToken, TokenError, TokenSigner};
pub use verifier::{CredentialInput, CredentialVerifier};
