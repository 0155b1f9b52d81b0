use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use chain_pulse::api::{self, AppState};
use chain_pulse::cache::SnapshotCache;
use chain_pulse::cli::{Cli, Commands};
use chain_pulse::config::Config;
use chain_pulse::eth::EthClient;
use chain_pulse::mempool::SyntheticMempool;
use chain_pulse::price::PriceFetcher;
use chain_pulse::refresh::Refresher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let eth = EthClient::new(&config.eth_rpc_url)?;
    let price = PriceFetcher::new(config.price_feed_url.clone(), config.price_asset_id.clone())?;
    let cache = SnapshotCache::new();
    let refresher = Arc::new(Refresher::new(
        eth.clone(),
        price,
        Arc::new(SyntheticMempool),
        cache,
    ));

    match cli.command {
        Commands::Serve { addr } => {
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            refresher
                .clone()
                .spawn_poller(Duration::from_secs(config.poll_interval_secs));
            let state = AppState { refresher, eth };
            api::run_http_server(&bind, state).await?;
        }
        Commands::SnapshotOnce => {
            refresher.run_cycle().await.context("refresh cycle failed")?;
            let snapshot = refresher.cache().snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
