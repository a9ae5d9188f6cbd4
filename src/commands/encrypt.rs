//! Encrypt command - password-based envelopes.

use anyhow::{Context, Result};
use clap::Args;

use fogwhisper::crypto::encrypt2;

use super::{message_or_stdin, CommandContext, CommandExecutor};

/// Encrypt a message into a JSON envelope.
///
/// With `--second-password` the message is double encrypted: first with
/// `--password`, then with the second password.
#[derive(Args, Debug)]
pub struct EncryptCommand {
    /// Message to encrypt (reads from stdin if not provided)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Password for the (inner) layer
    #[arg(short, long, env = "FOGWHISPER_PASSWORD")]
    pub password: String,

    /// Password for an outer second layer
    #[arg(long)]
    pub second_password: Option<String>,
}

impl CommandExecutor for EncryptCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let message = message_or_stdin(self.message.as_deref())?;
        let cipher = ctx.config.cipher();

        let envelope = match &self.second_password {
            Some(second) => encrypt2(&cipher, &message, &self.password, second)
                .context("Double encryption failed")?,
            None => cipher
                .encrypt(&message, &self.password)
                .context("Encryption failed")?,
        };

        println!("{}", envelope.to_json()?);
        Ok(())
    }
}
