//! Key generation command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fogwhisper::crypto::{export_public_key, max_message_len, RsaKeyPair};

use super::{CommandContext, CommandExecutor};

/// Generate an RSA-2048 key pair.
#[derive(Args, Debug)]
pub struct KeygenCommand {
    /// Output path for keys (creates .pub and .key files)
    #[arg(short, long, default_value = "fogwhisper")]
    pub output: PathBuf,

    /// Password protecting the private key file
    #[arg(short, long, env = "FOGWHISPER_KEY_PASSWORD")]
    pub password: String,
}

impl CommandExecutor for KeygenCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        eprintln!("Generating RSA-2048 key pair...");
        let keypair = RsaKeyPair::generate().context("Failed to generate key pair")?;
        keypair
            .save_to_files(&self.output, &self.password)
            .context("Failed to save key pair")?;

        let pub_path = self.output.with_extension("pub");
        let key_path = self.output.with_extension("key");

        println!("Key pair generated successfully:");
        println!();
        println!("  Public key:  {}", pub_path.display());
        println!("  Private key: {} (encrypted)", key_path.display());
        println!();
        println!(
            "Messages sealed to this key may be at most {} bytes.",
            max_message_len(keypair.public_key())
        );
        println!();
        println!("Share the public key (.pub). Keep the private key and its password secret.");

        tracing::debug!(
            public_key = %export_public_key(keypair.public_key())?,
            "generated key pair"
        );
        Ok(())
    }
}
