//! fogwhisper - layered message encryption and image steganography.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    CommandContext, CommandExecutor, DecryptCommand, EncryptCommand, HashPasswordCommand,
    HideCommand, KeygenCommand, LoginCommand, OpenCommand, RevealCommand, SealCommand,
    VerifyPasswordCommand,
};
use fogwhisper::{CryptoCapability, CryptoConfig};

/// fogwhisper - layered message encryption and image steganography
///
/// Password envelopes (AES-256-GCM over PBKDF2), two-password double
/// encryption, RSA-OAEP key pairs, and messages hidden in image pixels.
#[derive(Parser)]
#[command(name = "fogwhisper")]
#[command(version)]
#[command(about = "Layered message encryption and image steganography")]
struct Cli {
    /// JSON config file (defaults are used for missing fields)
    #[arg(short, long, global = true, env = "FOGWHISPER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an RSA key pair (.pub and encrypted .key files)
    Keygen(KeygenCommand),

    /// Unlock (or create on first use) a user's keys in the key vault
    Login(LoginCommand),

    /// Encrypt a message into a password envelope
    Encrypt(EncryptCommand),

    /// Decrypt a password envelope
    Decrypt(DecryptCommand),

    /// Hide an encrypted message in an image
    Hide(HideCommand),

    /// Reveal a message hidden in an image
    Reveal(RevealCommand),

    /// Hash a login password
    HashPassword(HashPasswordCommand),

    /// Verify a login password against a stored hash
    VerifyPassword(VerifyPasswordCommand),

    /// Seal a message into a layered transport record
    Seal(SealCommand),

    /// Open a layered transport record
    Open(OpenCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => CryptoConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CryptoConfig::default(),
    };

    if let CryptoCapability::Unsupported { reason } = CryptoCapability::detect() {
        tracing::warn!(%reason, "native cryptography unavailable");
    }

    let ctx = CommandContext { config };
    let command: &dyn CommandExecutor = match &cli.command {
        Commands::Keygen(cmd) => cmd,
        Commands::Login(cmd) => cmd,
        Commands::Encrypt(cmd) => cmd,
        Commands::Decrypt(cmd) => cmd,
        Commands::Hide(cmd) => cmd,
        Commands::Reveal(cmd) => cmd,
        Commands::HashPassword(cmd) => cmd,
        Commands::VerifyPassword(cmd) => cmd,
        Commands::Seal(cmd) => cmd,
        Commands::Open(cmd) => cmd,
    };
    command.execute(&ctx)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "fogwhisper=debug" } else { "fogwhisper=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
