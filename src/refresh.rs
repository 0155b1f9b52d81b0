//! The refresh pipeline: one cycle turns the upstream RPC into a fully
//! assembled snapshot, applied to the cache in a single write. Any failure
//! aborts the cycle and leaves the previous snapshot authoritative.
//!
//! Overlapping cycles (timer tick racing an on-demand refresh) are not
//! serialized; each builds its complete result locally, so the cache only
//! ever holds one cycle's coherent output, last writer wins.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use crate::cache::SnapshotCache;
use crate::eth::{normalize_block, normalize_tx, EthClient};
use crate::mempool::MempoolSource;
use crate::models::{NetworkInfo, Snapshot};
use crate::price::PriceFetcher;
use crate::units::{format_gwei, wei_to_gwei};

/// How many per-transaction summaries a cycle keeps, to bound upstream load.
pub const TX_SUMMARY_LIMIT: usize = 15;
/// Cadence of the background chain poller.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Staleness bound applied by the HTTP snapshot endpoint.
pub const SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(30);

pub struct Refresher {
    eth: EthClient,
    price: PriceFetcher,
    mempool: Arc<dyn MempoolSource>,
    cache: SnapshotCache,
}

impl Refresher {
    pub fn new(
        eth: EthClient,
        price: PriceFetcher,
        mempool: Arc<dyn MempoolSource>,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            eth,
            price,
            mempool,
            cache,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Run one refresh cycle. Steps are strictly sequential; the cache is
    /// only touched at the very end, with a complete result.
    pub async fn run_cycle(&self) -> Result<()> {
        let latest = self.eth.latest_block_number().await?;

        let block = self
            .eth
            .block_with_txs(latest)
            .await?
            .with_context(|| format!("block {} not yet available upstream", latest))?;
        let summary = normalize_block(&block)
            .with_context(|| format!("block {} is missing its number or hash", latest))?;

        let mut transactions = Vec::with_capacity(TX_SUMMARY_LIMIT.min(block.transactions.len()));
        for tx in block.transactions.iter().take(TX_SUMMARY_LIMIT) {
            match normalize_tx(tx, summary.number) {
                Ok(normalized) => transactions.push(normalized),
                Err(err) => {
                    tracing::warn!("skipping malformed transaction {:?}: {:#}", tx.hash, err)
                }
            }
        }

        let gas_price = self.eth.gas_price().await?;
        let network_info = NetworkInfo {
            block_number: summary.number,
            gas_price: format_gwei(gas_price),
            transaction_count: summary.transaction_count,
        };
        let mempool_stats = self.mempool.sample(wei_to_gwei(gas_price));

        tracing::debug!(
            block = summary.number,
            txs = transactions.len(),
            "applying refreshed snapshot"
        );
        self.cache
            .apply_refresh(summary, transactions, network_info, mempool_stats)
            .await;

        // The price feed runs on its own staleness clock; never let it block
        // or fail a chain cycle.
        let price = self.price.clone();
        let cache = self.cache.clone();
        tokio::spawn(async move { price.refresh_if_stale(&cache).await });

        Ok(())
    }

    /// The on-demand staleness policy: refresh inline when the cache is older
    /// than `max_age`, otherwise serve what is already there. A failed inline
    /// refresh falls back to the stale snapshot rather than erroring.
    pub async fn snapshot_fresh(&self, max_age: Duration) -> Snapshot {
        if self.cache.age().await > max_age {
            if let Err(err) = self.run_cycle().await {
                tracing::warn!("on-demand refresh failed, serving stale snapshot: {:#}", err);
            }
        }
        self.cache.snapshot().await
    }

    /// Background poll loop. Reschedules no matter how a cycle ends.
    pub fn spawn_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if let Err(err) = self.run_cycle().await {
                    tracing::warn!("refresh cycle failed, keeping previous snapshot: {:#}", err);
                }
                tokio::time::sleep(interval).await;
            }
        })
    }
}
