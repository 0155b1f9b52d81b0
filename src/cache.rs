//! The snapshot cache: the one shared mutable resource in the process.
//!
//! Readers take a full copy of the current state and never wait on the
//! network. Writers (the refresh pipeline and the price fetcher) assemble
//! their result entirely off to the side and swap it in under a single write
//! lock, so readers observe either the pre- or post-refresh state, never a
//! torn mix.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use crate::models::{
    BlockSummary, GasPricePoint, MempoolStats, NetworkInfo, PriceInfo, Snapshot, TxSummary,
};

pub const BLOCK_HISTORY_CAP: usize = 20;
pub const GAS_HISTORY_CAP: usize = 50;

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Default)]
struct CacheState {
    block: BlockSummary,
    transactions: Vec<TxSummary>,
    network_info: NetworkInfo,
    block_history: VecDeque<BlockSummary>,
    gas_price_history: VecDeque<GasPricePoint>,
    mempool_stats: MempoolStats,
    eth_price: PriceInfo,
    /// Millis since the epoch of the last successful chain refresh; 0 if none.
    last_update: i64,
}

/// Cheap-clone handle to the process-wide snapshot state. Constructed once at
/// startup with zero-valued defaults and injected wherever it is needed.
#[derive(Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<CacheState>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full copy of the current state. Never touches the network.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.inner.read().await;
        Snapshot {
            block: state.block.clone(),
            transactions: state.transactions.clone(),
            network_info: state.network_info.clone(),
            block_history: state.block_history.iter().cloned().collect(),
            gas_price_history: state.gas_price_history.iter().cloned().collect(),
            mempool_stats: state.mempool_stats.clone(),
            eth_price: state.eth_price.clone(),
            last_update: state.last_update,
        }
    }

    /// Age of the chain data. [`Duration::MAX`] before the first refresh.
    pub async fn age(&self) -> Duration {
        millis_to_age(self.inner.read().await.last_update)
    }

    pub async fn price_age(&self) -> Duration {
        millis_to_age(self.inner.read().await.eth_price.last_update)
    }

    /// One atomic write of a fully assembled refresh result. Callers must not
    /// invoke this with partial data; a failed cycle leaves the cache alone.
    pub async fn apply_refresh(
        &self,
        block: BlockSummary,
        transactions: Vec<TxSummary>,
        network_info: NetworkInfo,
        mempool_stats: MempoolStats,
    ) {
        let gas_point = GasPricePoint {
            block_number: block.number,
            gas_price: network_info.gas_price.parse().unwrap_or(0.0),
            timestamp: now_millis(),
        };

        let mut state = self.inner.write().await;
        state.block_history.push_front(block.clone());
        state.block_history.truncate(BLOCK_HISTORY_CAP);
        state.gas_price_history.push_front(gas_point);
        state.gas_price_history.truncate(GAS_HISTORY_CAP);
        state.block = block;
        state.transactions = transactions;
        state.network_info = network_info;
        state.mempool_stats = mempool_stats;
        state.last_update = now_millis();
    }

    pub async fn set_price(&self, price: PriceInfo) {
        self.inner.write().await.eth_price = price;
    }
}

fn millis_to_age(last_update: i64) -> Duration {
    if last_update <= 0 {
        return Duration::MAX;
    }
    let elapsed = now_millis().saturating_sub(last_update).max(0);
    Duration::from_millis(elapsed as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64) -> BlockSummary {
        BlockSummary {
            number,
            hash: format!("0x{:064x}", number),
            timestamp: 1_700_000_000 + number,
            transactions: vec![],
            gas_used: 1,
            gas_limit: 30_000_000,
            miner: "0x0000000000000000000000000000000000000000".into(),
            difficulty: "0".into(),
            transaction_count: 0,
        }
    }

    fn network(number: u64) -> NetworkInfo {
        NetworkInfo {
            block_number: number,
            gas_price: "12.50".into(),
            transaction_count: 0,
        }
    }

    fn tx(block_number: u64, n: u64) -> TxSummary {
        TxSummary {
            hash: format!("0x{:064x}", n),
            from: "0xa".into(),
            to: "0xb".into(),
            value: "1.000000".into(),
            gas_price: "12.50".into(),
            gas: 21_000,
            nonce: n,
            block_number,
        }
    }

    #[tokio::test]
    async fn starts_with_zero_valued_defaults() {
        let cache = SnapshotCache::new();
        let snap = cache.snapshot().await;
        assert_eq!(snap.last_update, 0);
        assert_eq!(snap.block.number, 0);
        assert!(snap.block_history.is_empty());
        assert_eq!(snap.eth_price.usd, 0.0);
        assert_eq!(cache.age().await, Duration::MAX);
    }

    #[tokio::test]
    async fn histories_are_bounded_with_newest_first() {
        let cache = SnapshotCache::new();
        for n in 1..=60u64 {
            cache
                .apply_refresh(block(n), vec![], network(n), MempoolStats::default())
                .await;
        }

        let snap = cache.snapshot().await;
        assert_eq!(snap.block_history.len(), BLOCK_HISTORY_CAP);
        assert_eq!(snap.gas_price_history.len(), GAS_HISTORY_CAP);
        assert_eq!(snap.block_history[0].number, 60);
        assert_eq!(snap.gas_price_history[0].block_number, 60);
        // oldest survivors
        assert_eq!(snap.block_history[BLOCK_HISTORY_CAP - 1].number, 41);
        assert_eq!(snap.gas_price_history[GAS_HISTORY_CAP - 1].block_number, 11);
    }

    #[tokio::test]
    async fn head_of_history_matches_cached_block() {
        let cache = SnapshotCache::new();
        cache
            .apply_refresh(block(7), vec![tx(7, 0)], network(7), MempoolStats::default())
            .await;

        let snap = cache.snapshot().await;
        assert_eq!(snap.block.number, snap.block_history[0].number);
        assert_eq!(snap.block.hash, snap.block_history[0].hash);
        assert!(snap.last_update > 0);
    }

    #[tokio::test]
    async fn transactions_belong_to_the_cached_block() {
        let cache = SnapshotCache::new();
        cache
            .apply_refresh(
                block(3),
                vec![tx(3, 0), tx(3, 1)],
                network(3),
                MempoolStats::default(),
            )
            .await;
        cache
            .apply_refresh(block(4), vec![tx(4, 2)], network(4), MempoolStats::default())
            .await;

        let snap = cache.snapshot().await;
        assert!(snap
            .transactions
            .iter()
            .all(|t| t.block_number == snap.block.number));
    }

    #[tokio::test]
    async fn price_lifecycle_is_independent_of_chain_data() {
        let cache = SnapshotCache::new();
        assert_eq!(cache.price_age().await, Duration::MAX);

        cache
            .set_price(PriceInfo {
                usd: 2500.0,
                change_24h: -1.2,
                last_update: now_millis(),
            })
            .await;

        let snap = cache.snapshot().await;
        assert_eq!(snap.eth_price.usd, 2500.0);
        // chain data untouched
        assert_eq!(snap.last_update, 0);
        assert!(cache.price_age().await < Duration::from_secs(5));
    }
}
