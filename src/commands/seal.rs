//! Seal command - builds a layered transport message.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use fogwhisper::crypto::load_public_key;
use fogwhisper::{MessageSealer, MessageType, SealOptions, TransportMessage};

use super::{message_or_stdin, CommandContext, CommandExecutor};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MessageTypeArg {
    Permanent,
    Temporary,
    SelfDestruct,
}

impl From<MessageTypeArg> for MessageType {
    fn from(arg: MessageTypeArg) -> Self {
        match arg {
            MessageTypeArg::Permanent => MessageType::Permanent,
            MessageTypeArg::Temporary => MessageType::Temporary,
            MessageTypeArg::SelfDestruct => MessageType::SelfDestruct,
        }
    }
}

/// Seal a message for transport.
///
/// Layers are picked from what is supplied: a recipient key gives RSA-OAEP
/// (plus the legacy XOR layer with `--xor-key`); otherwise one or two
/// passwords give AES-GCM or double encryption; nothing gives a plain message.
#[derive(Args, Debug)]
pub struct SealCommand {
    /// Message to seal (reads from stdin if not provided)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Sender name recorded in the transport record
    #[arg(long)]
    pub from: String,

    /// Receiver name recorded in the transport record
    #[arg(long)]
    pub to: Option<String>,

    /// Recipient's public key file (.pub)
    #[arg(long)]
    pub their_key: Option<PathBuf>,

    /// Extra key for the legacy XOR layer (requires --their-key)
    #[arg(long, requires = "their_key")]
    pub xor_key: Option<String>,

    /// Password for a symmetric layer
    #[arg(short, long, conflicts_with = "their_key")]
    pub password: Option<String>,

    /// Outer password for double encryption
    #[arg(long, requires = "password")]
    pub second_password: Option<String>,

    /// Message lifetime
    #[arg(long, value_enum, default_value = "permanent")]
    pub lifetime: MessageTypeArg,
}

impl CommandExecutor for SealCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let message = message_or_stdin(self.message.as_deref())?;
        let recipient = self
            .their_key
            .as_ref()
            .map(|path| {
                load_public_key(path)
                    .with_context(|| format!("Failed to load public key {}", path.display()))
            })
            .transpose()?;

        let sealer = MessageSealer::from_config(&ctx.config);
        let options = SealOptions {
            recipient: recipient.as_ref(),
            xor_key: self.xor_key.as_deref(),
            password: self.password.as_deref(),
            second_password: self.second_password.as_deref(),
        };
        let sealed = sealer.seal(&message, &options)?;

        let transport = TransportMessage::new(
            self.from.clone(),
            self.to.clone(),
            sealed,
            self.lifetime.into(),
        );
        println!("{}", serde_json::to_string_pretty(&transport)?);
        Ok(())
    }
}
