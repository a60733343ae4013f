//! Auth handlers and supporting modules.
//!
//! Routes follow the NextAuth layout (`/api/auth/...`) so existing front ends
//! can keep their sign-in forms and session polling.
//!
//! ## Session transport
//!
//! The signed identity token travels in the `coursely.session-token` cookie
//! (`HttpOnly`, `SameSite=Lax`, `Secure` on https deployments). API clients may
//! send the same token as `Authorization: Bearer <token>` instead.
//!
//! ## Failures
//!
//! Credential failures always answer `401 Invalid credentials`, whatever the
//! reason. An absent or invalid token is "no session" (`200 {}`), not an error.

pub(crate) mod credentials;
pub(crate) mod github;
pub(crate) mod providers;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;

pub use state::AuthState;
