//! Hide command - embeds an encrypted message in an image.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fogwhisper::stego::{ImageStego, StegoCodec};

use super::{message_or_stdin, CommandContext, CommandExecutor};

/// Hide a message in a PNG or BMP image.
///
/// The output is always written as PNG; lossy formats would destroy the
/// hidden bits.
#[derive(Args, Debug)]
pub struct HideCommand {
    /// Carrier image (PNG or BMP)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Output image path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Message to hide (reads from stdin if not provided)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Password for both encryption and pixel ordering
    #[arg(short, long, env = "FOGWHISPER_PASSWORD")]
    pub password: String,
}

impl CommandExecutor for HideCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let message = message_or_stdin(self.message.as_deref())?;
        let carrier = ImageStego::from_file(&self.image)
            .with_context(|| format!("Failed to load {}", self.image.display()))?;

        let codec = StegoCodec::new(ctx.config.cipher());
        let stego = carrier.hide(&codec, &message, &self.password)?;
        stego.save(&self.output)?;

        println!("Message hidden in {}", self.output.display());
        println!("Carrier capacity: {} characters", carrier.capacity_chars());
        Ok(())
    }
}
