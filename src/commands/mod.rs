//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod decrypt;
mod encrypt;
mod hide;
mod keygen;
mod login;
mod open;
mod password;
mod reveal;
mod seal;

pub use decrypt::DecryptCommand;
pub use encrypt::EncryptCommand;
pub use hide::HideCommand;
pub use keygen::KeygenCommand;
pub use login::LoginCommand;
pub use open::OpenCommand;
pub use password::{HashPasswordCommand, VerifyPasswordCommand};
pub use reveal::RevealCommand;
pub use seal::SealCommand;

use std::io::{self, Read};

use anyhow::{Context, Result};

use fogwhisper::CryptoConfig;

/// Shared state every command runs with.
pub struct CommandContext {
    pub config: CryptoConfig,
}

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Returns `message`, or reads it from stdin when absent.
pub(crate) fn message_or_stdin(message: Option<&str>) -> Result<String> {
    match message {
        Some(m) => Ok(m.to_string()),
        None => {
            eprintln!("Reading message from stdin (Ctrl+D to finish):");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read message from stdin")?;
            Ok(buffer.trim_end_matches('\n').to_string())
        }
    }
}
