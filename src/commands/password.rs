//! Login credential hashing commands.

use anyhow::{bail, Result};
use clap::Args;

use fogwhisper::crypto::password::{hash_password_with_iterations, verify_password_with_iterations};

use super::{CommandContext, CommandExecutor};

/// Hash a password into the stored `salt:hash` form.
#[derive(Args, Debug)]
pub struct HashPasswordCommand {
    #[arg(short, long, env = "FOGWHISPER_PASSWORD")]
    pub password: String,
}

impl CommandExecutor for HashPasswordCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let credential =
            hash_password_with_iterations(&self.password, ctx.config.password_hash_iterations);
        println!("{}", credential.combined);
        Ok(())
    }
}

/// Check a password against a stored `salt:hash`.
#[derive(Args, Debug)]
pub struct VerifyPasswordCommand {
    #[arg(short, long, env = "FOGWHISPER_PASSWORD")]
    pub password: String,

    /// Stored credential (`salt:hash`, hex)
    #[arg(long)]
    pub hash: String,
}

impl CommandExecutor for VerifyPasswordCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        if verify_password_with_iterations(
            &self.password,
            &self.hash,
            ctx.config.password_hash_iterations,
        )? {
            println!("Password matches.");
            Ok(())
        } else {
            bail!("Password does not match")
        }
    }
}
