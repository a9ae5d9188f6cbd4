//! Open command - removes the layers of a transport message.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use fogwhisper::crypto::{export_public_key, RsaKeyPair};
use fogwhisper::{FileKeyVault, KeyPairManager, MessageSealer, OpenKeys, TransportMessage};

use super::{message_or_stdin, CommandContext, CommandExecutor};

/// Open a sealed transport message.
///
/// Failures print the placeholder a chat view would show (for example
/// `[Decryption Failed]`) instead of aborting, unless `--strict` is set.
#[derive(Args, Debug)]
pub struct OpenCommand {
    /// File containing the transport JSON (reads from stdin if not provided)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Own key pair base path (loads the .key file)
    #[arg(short, long, conflicts_with = "user")]
    pub key: Option<PathBuf>,

    /// Unlock own keys from the key vault as this user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password protecting the private key
    #[arg(long, env = "FOGWHISPER_KEY_PASSWORD")]
    pub key_password: Option<String>,

    /// Extra key for the legacy XOR layer
    #[arg(long)]
    pub xor_key: Option<String>,

    /// Password for a symmetric layer
    #[arg(short, long)]
    pub password: Option<String>,

    /// Outer password of a double-encrypted message
    #[arg(long)]
    pub second_password: Option<String>,

    /// Fail instead of printing a placeholder
    #[arg(long)]
    pub strict: bool,
}

impl CommandExecutor for OpenCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let json = match &self.input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => message_or_stdin(None)?,
        };
        let transport: TransportMessage =
            serde_json::from_str(&json).context("Invalid transport message")?;

        let keypair = self.own_key_pair(ctx)?;
        let public_key = keypair
            .as_ref()
            .map(|kp| export_public_key(kp.public_key()))
            .transpose()?;

        let keys = OpenKeys {
            private_key: keypair.as_ref().map(|kp| kp.private_key()),
            public_key: public_key.as_deref(),
            xor_key: self.xor_key.as_deref(),
            password: self.password.as_deref(),
            second_password: self.second_password.as_deref(),
        };

        let sealer = MessageSealer::from_config(&ctx.config);
        let text = if self.strict {
            sealer.open(&transport.content, &keys)?
        } else {
            sealer.open_for_display(&transport.content, &keys)
        };

        println!("From: {}", transport.sender);
        println!("{}", text);
        Ok(())
    }
}

impl OpenCommand {
    fn own_key_pair(&self, ctx: &CommandContext) -> Result<Option<Arc<RsaKeyPair>>> {
        if self.key.is_none() && self.user.is_none() {
            return Ok(None);
        }
        let Some(password) = self.key_password.as_deref() else {
            bail!("--key-password is required to unlock a private key");
        };

        if let Some(base) = &self.key {
            let keypair = RsaKeyPair::load_from_files(base, password)
                .with_context(|| format!("Failed to unlock {}", base.display()))?;
            return Ok(Some(Arc::new(keypair)));
        }

        let Some(user) = self.user.as_deref() else {
            return Ok(None);
        };
        let manager = KeyPairManager::new(FileKeyVault::new(&ctx.config.vault_path));
        if manager.public_key_of(user)?.is_none() {
            bail!("No keys stored for '{}'; run `fogwhisper login` first", user);
        }
        Ok(Some(manager.login(user, password)?))
    }
}
