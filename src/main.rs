use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use mintcheck::config;
use mintcheck::domain::abi::AbiDecoder;
use mintcheck::infrastructure::content::{ContentStore, IpfsClusterClient};
use mintcheck::infrastructure::runtime::{ReclaimExpiredTask, Scheduler, VerifyContentTask};
use mintcheck::infrastructure::{EthClient, InterfaceDecoder};
use mintcheck::store::SqliteStore;

#[derive(Debug, Parser)]
#[command(
    name = "mintcheck",
    version,
    about = "Confirms uploaded content against NFT mint transactions"
)]
struct Args {
    /// Config file (defaults to ~/.config/mintcheck/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// Run every task once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = config::load(args.config.as_deref())?;
    if let Some(rpc) = args.rpc {
        config.rpc_url = rpc;
    }
    info!(
        source = %args
            .config
            .clone()
            .or_else(config::config_path)
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "defaults".to_string()),
        rpc = %config.rpc_url,
        "configuration loaded"
    );

    let interface = config.contract_interface()?;
    let decoder = InterfaceDecoder::new(&interface)?;
    info!(functions = decoder.index().len(), "contract interface indexed");
    let decoder: Arc<dyn AbiDecoder> = Arc::new(decoder);

    let db_path = config
        .database_path()
        .context("no database path configured and no data directory available")?;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create data dir {}", parent.display()))?;
    }
    let store = Arc::new(SqliteStore::open(&db_path)?);
    info!(db = %db_path.display(), "record store opened");

    let content: Arc<dyn ContentStore> =
        Arc::new(IpfsClusterClient::new((&config.content_store).into())?);
    let client = Arc::new(EthClient::http(config.rpc_url.clone())?);

    match client.get_block_number().await {
        Ok(head) => info!(endpoint = %client.endpoint_name(), head, "connected to node"),
        Err(err) => warn!(endpoint = %client.endpoint_name(), "node unreachable: {err}"),
    }

    let mut scheduler = Scheduler::new(config.scheduler.tick());
    scheduler.add(
        Arc::new(VerifyContentTask::new(
            store.clone(),
            client,
            decoder,
            config.mint_function.clone(),
        )),
        config.scheduler.verify_every(),
    );
    scheduler.add(
        Arc::new(ReclaimExpiredTask::new(store, content)),
        config.scheduler.reclaim_every(),
    );

    if args.once {
        scheduler.run_all_once().await;
        return Ok(());
    }

    tokio::select! {
        _ = scheduler.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("listen for shutdown signal")?;
            info!("shutting down");
        }
    }

    Ok(())
}
