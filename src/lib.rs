//! # Coursely (course platform authentication)
//!
//! `coursely` signs users into the course platform with either an
//! email/password pair or a GitHub account, and keeps them signed in with a
//! signed session token.
//!
//! ## Login
//!
//! Credentials are checked against the `users` table: exactly one account is
//! looked up by email and the supplied password is compared with the stored
//! Argon2 hash. Unknown emails and wrong passwords produce the same failure so
//! callers cannot tell which accounts exist.
//!
//! ## Sessions
//!
//! A successful login writes the principal's identity (`id`, `name`, `role`,
//! `email`) into an HS256 token carried by the `coursely.session-token`
//! cookie or an `Authorization: Bearer` header. Every request rebuilds the
//! session view from that token alone; a missing or invalid token is simply
//! "no session".

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
