//! Reveal command - extracts a message hidden by `hide`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fogwhisper::stego::{ImageStego, StegoCodec};

use super::{CommandContext, CommandExecutor};

/// Reveal a message hidden in an image.
#[derive(Args, Debug)]
pub struct RevealCommand {
    /// Image containing a hidden message
    #[arg(short, long)]
    pub image: PathBuf,

    /// Password used when hiding
    #[arg(short, long, env = "FOGWHISPER_PASSWORD")]
    pub password: String,
}

impl CommandExecutor for RevealCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let stego = ImageStego::from_file(&self.image)
            .with_context(|| format!("Failed to load {}", self.image.display()))?;
        let codec = StegoCodec::new(ctx.config.cipher());
        let message = stego
            .reveal(&codec, &self.password)
            .context("No message could be revealed")?;
        println!("{}", message);
        Ok(())
    }
}
