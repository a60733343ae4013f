//! Argon2 password hashing and verification.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use tracing::error;

/// Hash a password into an Argon2id PHC string with a random salt.
///
/// # Errors
/// Returns an error if salt encoding or hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Compare a plaintext password with a stored PHC hash.
///
/// The hash carries its own salt and parameters; the output comparison is
/// constant time. An unparseable hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Run [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
        Ok(matched) => matched,
        Err(err) => {
            error!("Password verification task failed: {err}");
            false
        }
    }
}
