use crate::auth::password::hash_password;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

/// Print an Argon2 PHC string for `password` on stdout.
/// # Errors
/// Returns an error if hashing fails.
pub fn execute(password: &SecretString) -> Result<()> {
    println!("{}", phc(password)?);
    Ok(())
}

fn phc(password: &SecretString) -> Result<String> {
    hash_password(password.expose_secret()).context("Failed to hash password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;

    #[test]
    fn phc_verifies_against_input() -> Result<()> {
        let hash = phc(&SecretString::from("correct horse".to_string()))?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        Ok(())
    }
}
