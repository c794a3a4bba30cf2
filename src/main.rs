//! CryptoArt admin CLI
//!
//! Inspects and transfers ownership of the deployed CryptoArt contract,
//! directly or through its Safe.

use clap::{Parser, Subcommand};
use cryptoart_admin::cli::{self, AppContext};
use cryptoart_admin::config::{AdminConfig, ConfigSource};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "cryptoart-admin")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "CryptoArt contract administration through a Safe", long_about = None)]
struct Cli {
    /// Network name or chain id
    #[arg(short, long, global = true, default_value = "rinkeby")]
    network: String,

    /// Hex private key of the signer
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true, global = true)]
    private_key: Option<String>,

    /// Mnemonic of the signer (used when no private key is given)
    #[arg(long, env = "MNEMONIC", hide_env_values = true, global = true)]
    mnemonic: Option<String>,

    /// Alchemy API key
    #[arg(long, env = "ALCHEMY_KEY", hide_env_values = true, global = true)]
    alchemy_key: Option<String>,

    /// hardhat-deploy export
    #[arg(long, global = true, default_value = "deployments.json")]
    deployments: PathBuf,

    /// Safe address book
    #[arg(long, global = true, default_value = "config.json")]
    safe_config: PathBuf,

    /// Seconds between confirmation and execution checks
    #[arg(long, global = true, default_value = "10")]
    poll_interval_secs: u64,

    /// Give up after this many checks (default: wait forever)
    #[arg(long, global = true)]
    max_polls: Option<u32>,

    /// Propose even if another pending proposal uses the same Safe nonce
    #[arg(long, global = true)]
    allow_nonce_reuse: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current contract owner
    Owner,

    /// Transfer ownership from the signer to the Safe
    TransferToSafe,

    /// Transfer ownership from the Safe to the signer
    TransferFromSafe,

    /// Propose and execute an arbitrary call through the Safe
    Propose {
        /// Target contract address
        #[arg(short, long)]
        to: String,

        /// Hex encoded call data
        #[arg(short, long)]
        data: String,
    },
}

impl Cli {
    fn config_source(&self) -> ConfigSource {
        ConfigSource {
            private_key: self.private_key.clone(),
            mnemonic: self.mnemonic.clone(),
            alchemy_key: self.alchemy_key.clone(),
            deployments_path: Some(self.deployments.clone()),
            safe_config_path: Some(self.safe_config.clone()),
            poll_interval: Some(Duration::from_secs(self.poll_interval_secs)),
            max_polls: self.max_polls,
            allow_nonce_reuse: self.allow_nonce_reuse,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AdminConfig::validate(cli.config_source())?;

    let cancel = CancellationToken::new();
    let ctx = AppContext::new(&cli.network, config, cancel.clone())?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping");
                cancel.cancel();
            }
        });

        match cli.command {
            Commands::Owner => cli::cmd_owner(&ctx).await,
            Commands::TransferToSafe => cli::cmd_transfer_to_safe(&ctx).await,
            Commands::TransferFromSafe => cli::cmd_transfer_from_safe(&ctx).await,
            Commands::Propose { to, data } => cli::cmd_propose(&ctx, &to, &data).await,
        }
    })
}
