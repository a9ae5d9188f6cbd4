//! Login command - unlocks or creates a user's vault keys.

use anyhow::{Context, Result};
use clap::Args;

use fogwhisper::crypto::{export_public_key, max_message_len};
use fogwhisper::{FileKeyVault, KeyPairManager, LoginStage};

use super::{CommandContext, CommandExecutor};

/// Log in as a user: the first login generates a key pair and stores it
/// encrypted in the vault; later logins unlock it.
#[derive(Args, Debug)]
pub struct LoginCommand {
    #[arg(short, long)]
    pub user: String,

    #[arg(short, long, env = "FOGWHISPER_KEY_PASSWORD")]
    pub password: String,
}

impl CommandExecutor for LoginCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let vault = FileKeyVault::new(&ctx.config.vault_path);
        let manager = KeyPairManager::new(vault);

        let keypair = manager
            .login_with_progress(&self.user, &self.password, |stage| match stage {
                LoginStage::UnlockingKeys => eprintln!("Unlocking keys..."),
                LoginStage::GeneratingKeys => eprintln!("Generating keys..."),
                LoginStage::Ready => {}
            })
            .with_context(|| format!("Login failed for '{}'", self.user))?;

        println!("Logged in as {}", self.user);
        println!("Vault: {}", manager.vault().path().display());
        println!("Max RSA message: {} bytes", max_message_len(keypair.public_key()));
        println!();
        println!("Public key:");
        println!("{}", export_public_key(keypair.public_key())?);
        Ok(())
    }
}
