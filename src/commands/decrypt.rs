//! Decrypt command - opens envelopes produced by `encrypt`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use fogwhisper::crypto::{decrypt2, Algorithm, EncryptedEnvelope};

use super::{message_or_stdin, CommandContext, CommandExecutor};

/// Decrypt a JSON envelope.
#[derive(Args, Debug)]
pub struct DecryptCommand {
    /// Envelope JSON (reads from stdin if neither this nor --input is given)
    #[arg(short, long, conflicts_with = "input")]
    pub envelope: Option<String>,

    /// File containing the envelope JSON
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Password for the (inner) layer
    #[arg(short, long, env = "FOGWHISPER_PASSWORD")]
    pub password: String,

    /// Password for the outer layer of a double-encrypted envelope
    #[arg(long)]
    pub second_password: Option<String>,
}

impl CommandExecutor for DecryptCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let json = match &self.input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => message_or_stdin(self.envelope.as_deref())?,
        };
        let envelope = EncryptedEnvelope::from_json(json.trim()).context("Invalid envelope")?;

        let plaintext = match (envelope.algorithm, &self.second_password) {
            (Algorithm::DoubleAes256Gcm, Some(second)) => {
                decrypt2(&envelope, &self.password, second)?
            }
            (Algorithm::DoubleAes256Gcm, None) => {
                bail!("Envelope is double encrypted; pass --second-password")
            }
            (Algorithm::Aes256Gcm, _) => ctx.config.cipher().decrypt(&envelope, &self.password)?,
        };

        println!("{}", plaintext);
        Ok(())
    }
}
