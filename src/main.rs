use alph_wallet_core::addresses::Address;
use alph_wallet_core::config::StorageConfig;
use alph_wallet_core::session::WalletSession;
use alph_wallet_core::settings::{NetworkName, NetworkSettings};
use alph_wallet_core::transactions::{classify_json, TransactionView};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "alph-wallet")]
#[command(about = "Inspect wallet settings, stored wallets and transactions", long_about = None)]
struct Cli {
    /// Storage directory, overrides ALPH_WALLET_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the current settings and the derived network name
    Settings,
    /// Switch to the endpoints of a preset network
    Network {
        #[arg(value_enum)]
        name: PresetNetwork,
    },
    /// List stored wallets
    Wallets,
    /// Classify an explorer or pending transaction record
    Classify {
        /// JSON file holding the transaction
        transaction: PathBuf,
        /// Address the transaction is viewed from
        address: String,
        /// Other addresses of the same wallet
        wallet_addresses: Vec<String>,
    },
}

/// Networks with compiled-in endpoints; custom endpoints go through the settings file
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PresetNetwork {
    Mainnet,
    Testnet,
    Localhost,
}

impl From<PresetNetwork> for NetworkName {
    fn from(network: PresetNetwork) -> Self {
        match network {
            PresetNetwork::Mainnet => NetworkName::Mainnet,
            PresetNetwork::Testnet => NetworkName::Testnet,
            PresetNetwork::Localhost => NetworkName::Localhost,
        }
    }
}

fn main() -> Result<()> {
    // RUST_LOG=debug for classification and reconciliation detail
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match cli.data_dir {
        Some(data_dir) => StorageConfig { data_dir },
        None => StorageConfig::from_env(),
    };
    let mut session = WalletSession::init(config.open_store());

    match cli.command {
        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(session.settings())?);
            println!("network: {}", session.current_network());
        }
        Commands::Network { name } => {
            session
                .update_network_settings(NetworkSettings::preset(name.into()))
                .ok_or_else(|| anyhow!("settings could not be updated"))?;
            println!("network: {}", session.current_network());
        }
        Commands::Wallets => {
            for wallet in session.list_wallets()? {
                println!("{}  {}", wallet.id, wallet.name);
            }
        }
        Commands::Classify {
            transaction,
            address,
            wallet_addresses,
        } => {
            let contents = fs::read_to_string(&transaction)
                .with_context(|| format!("reading {}", transaction.display()))?;
            let value: serde_json::Value = serde_json::from_str(&contents)?;

            let mut addresses = Vec::new();
            for (index, hash) in std::iter::once(&address)
                .chain(wallet_addresses.iter())
                .enumerate()
            {
                addresses.push(Address::new(hash.as_str(), "", "", index as u32)?);
            }

            let info = classify_json(&value, &address, &addresses, TransactionView::Wallet)?;
            println!("direction: {:?}", info.direction);
            println!("type:      {:?}", info.info_type);
            println!("amount:    {}", info.amount);
            println!("timestamp: {}", info.timestamp);
            if let Some(lock_time) = info.lock_time {
                println!("locked:    {}", lock_time.to_rfc3339());
            }
        }
    }

    Ok(())
}
