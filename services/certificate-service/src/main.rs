//! Certificate Service
//!
//! Serves certificates and issuer memberships reconstructed from the
//! VeriCred contract's event logs, and pins new certificate metadata.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use alloy_primitives::Address;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use vericred_core::config::{PinningCredentials, DEFAULT_GATEWAY_URL, DEFAULT_PINNING_URL, DEFAULT_RPC_URL};
use vericred_core::{BlockTag, HolderEncoding, IndexerConfig};
use vericred_indexer::CertificateQuery;

mod api;
mod error;

/// Where certificate events carry the holder identifier
#[derive(Clone, Copy, Debug, ValueEnum)]
enum HolderEncodingArg {
    /// Plain event data
    EventData,
    /// Indexed hash; recovered from the issuing transaction
    TransactionInput,
}

impl From<HolderEncodingArg> for HolderEncoding {
    fn from(arg: HolderEncodingArg) -> Self {
        match arg {
            HolderEncodingArg::EventData => HolderEncoding::EventData,
            HolderEncodingArg::TransactionInput => HolderEncoding::TransactionInput,
        }
    }
}

/// Certificate Service CLI arguments
#[derive(Parser, Debug)]
#[command(name = "certificate-service")]
#[command(about = "VeriCred certificate query service")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8090")]
    port: u16,

    /// Chain JSON-RPC endpoint
    #[arg(long, env = "VERICRED_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Certificate contract address
    #[arg(long, env = "VERICRED_CONTRACT")]
    contract: Option<Address>,

    /// Holder layout of the deployed contract's certificate events
    #[arg(long, value_enum, default_value = "event-data")]
    holder_encoding: HolderEncodingArg,

    /// First block of the certificate scan
    #[arg(long, default_value = "earliest")]
    from_block: BlockTag,

    /// Recent-block window for issuer scans; 0 scans the full history
    #[arg(long, default_value = "100000")]
    issuer_window: u64,

    /// Per-fetch timeout for blocks, transactions and metadata
    #[arg(long, default_value = "10000")]
    fetch_timeout_ms: u64,

    /// Maximum certificates resolved concurrently
    #[arg(long, default_value = "16")]
    max_concurrent_fetches: usize,

    /// IPFS gateway base URL
    #[arg(long, default_value = DEFAULT_GATEWAY_URL)]
    gateway_url: String,

    /// Pinning endpoint
    #[arg(long, default_value = DEFAULT_PINNING_URL)]
    pinning_url: String,

    /// Pinata API key
    #[arg(long, env = "PINATA_API_KEY", hide_env_values = true)]
    pinata_api_key: Option<String>,

    /// Pinata secret API key
    #[arg(long, env = "PINATA_SECRET_API_KEY", hide_env_values = true)]
    pinata_secret_api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn indexer_config(&self) -> IndexerConfig {
        let mut config = IndexerConfig::default();

        config.chain.rpc_url = self.rpc_url.clone();
        config.chain.contract_address = self.contract;
        config.chain.holder_encoding = self.holder_encoding.into();

        config.reconstruction.from_block = self.from_block;
        config.reconstruction.fetch_timeout_ms = self.fetch_timeout_ms;
        config.reconstruction.max_concurrent_fetches = self.max_concurrent_fetches;

        config.issuers.window_blocks = self.issuer_window;

        config.ipfs.gateway_url = self.gateway_url.clone();
        config.ipfs.pinning_url = self.pinning_url.clone();
        config.ipfs.credentials = PinningCredentials::from_parts(
            self.pinata_api_key.clone(),
            self.pinata_secret_api_key.clone(),
        );

        config
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub query: CertificateQuery,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting Certificate Service");
    info!("RPC endpoint: {}", args.rpc_url);

    let config = args.indexer_config();
    match config.chain.contract_address {
        Some(contract) => info!("Certificate contract: {}", contract),
        None => warn!("No certificate contract configured; queries will fail until one is set"),
    }
    if config.ipfs.credentials.is_none() {
        warn!("Pinata API keys are not configured; pinning is disabled");
    }

    let query = CertificateQuery::from_config(config).context("Failed to initialize query clients")?;
    let app_state = web::Data::new(AppState { query });

    info!("Binding to {}:{}", args.host, args.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(api::configure_routes)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await?;

    Ok(())
}
