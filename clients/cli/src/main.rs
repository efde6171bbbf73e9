//! VeriCred command-line client
//!
//! Queries certificates and issuers reconstructed from the contract's event
//! logs, and pins new certificate metadata.

use alloy_primitives::Address;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use vericred_core::config::PinningCredentials;
use vericred_core::{IssuerConfig, Role};
use vericred_indexer::CertificateQuery;
use vericred_ipfs::CertificateFields;

mod config;
mod output;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "vericred")]
#[command(version, about = "VeriCred certificate client")]
struct Cli {
    /// Config file
    #[arg(long, env = "VERICRED_CONFIG")]
    config: Option<PathBuf>,

    /// Chain JSON-RPC endpoint, overriding the config file
    #[arg(long, env = "VERICRED_RPC_URL")]
    rpc_url: Option<String>,

    /// Certificate contract address, overriding the config file
    #[arg(long, env = "VERICRED_CONTRACT")]
    contract: Option<Address>,

    /// Print JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List certificates
    Certificates {
        /// Only certificates of this holder (case-insensitive)
        #[arg(long)]
        holder: Option<String>,
    },

    /// List issuer memberships
    Issuers {
        /// Scan from genesis instead of the configured recent window
        #[arg(long)]
        full_history: bool,
    },

    /// Show the role of an account
    Role {
        /// Account address
        address: Address,
    },

    /// Pin certificate metadata and print its URI
    Pin {
        /// Recipient name
        #[arg(long)]
        recipient_name: String,

        /// Recipient e-mail address
        #[arg(long)]
        recipient_email: String,

        /// Certificate title
        #[arg(long)]
        title: String,

        /// Certificate description
        #[arg(long)]
        description: String,

        /// Pinata API key
        #[arg(long, env = "PINATA_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Pinata secret API key
        #[arg(long, env = "PINATA_SECRET_API_KEY", hide_env_values = true)]
        secret_api_key: Option<String>,
    },

    /// Show the config file
    Config,
}

#[derive(Serialize)]
struct RoleOutput {
    address: Address,
    role: Role,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config_path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let mut config = CliConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(rpc_url) = &cli.rpc_url {
        config.chain.rpc_url = rpc_url.clone();
    }
    if let Some(contract) = cli.contract {
        config.chain.contract_address = Some(contract);
    }
    let json = cli.json || config.json_output;

    match cli.command {
        Commands::Certificates { holder } => {
            let query = CertificateQuery::from_config(config.indexer_config())?;
            let pb = output::spinner("Reconstructing certificates from chain...");
            let result = query.reconstruct_certificates().await;
            pb.finish_and_clear();

            let mut set = result?;
            if let Some(holder) = &holder {
                set.records = vericred_indexer::filter_by_holder(set.records, holder);
            }

            if json {
                output::print_json(&set.records)?;
            } else {
                output::print_certificates(&set.records, &set.skipped);
            }
        }

        Commands::Issuers { full_history } => {
            if full_history {
                config.issuers = IssuerConfig::full_history();
            }
            let query = CertificateQuery::from_config(config.indexer_config())?;
            let pb = output::spinner("Reconstructing issuers from chain...");
            let result = query.get_issuers().await;
            pb.finish_and_clear();

            let issuers = result?;
            if json {
                output::print_json(&issuers)?;
            } else {
                output::print_issuers(&issuers);
            }
        }

        Commands::Role { address } => {
            let query = CertificateQuery::from_config(config.indexer_config())?;
            let role = query.role_of(address).await?;
            if json {
                output::print_json(&RoleOutput { address, role })?;
            } else {
                output::print_role(role);
            }
        }

        Commands::Pin {
            recipient_name,
            recipient_email,
            title,
            description,
            api_key,
            secret_api_key,
        } => {
            let mut indexer = config.indexer_config();
            indexer.ipfs.credentials = PinningCredentials::from_parts(api_key, secret_api_key);
            let query = CertificateQuery::from_config(indexer)?;

            let fields = CertificateFields {
                recipient_name,
                recipient_email,
                certificate_title: title,
                certificate_description: description,
            };
            let pb = output::spinner("Pinning certificate metadata...");
            let result = query.pin_certificate_data(&fields).await;
            pb.finish_and_clear();

            let receipt = result?;
            if json {
                output::print_json(&receipt)?;
            } else {
                output::print_receipt(&receipt);
            }
        }

        Commands::Config => {
            println!("{}", config_path.display());
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
