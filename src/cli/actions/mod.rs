pub mod hash_password;
pub mod server;

mod run;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    HashPassword { password: SecretString },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
