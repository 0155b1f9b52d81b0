use serde::Serialize;

/// Recipient shown when a transaction has no `to` address.
pub const CONTRACT_CREATION: &str = "Contract Creation";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub number: u64,
    pub hash: String,
    /// Block timestamp in seconds since the epoch.
    pub timestamp: u64,
    /// Hashes of every transaction in the block, in block order.
    pub transactions: Vec<String>,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub miner: String,
    pub difficulty: String,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSummary {
    pub hash: String,
    pub from: String,
    /// Recipient address, or [`CONTRACT_CREATION`] for deployments.
    pub to: String,
    /// Value in ether, fixed six decimal places.
    pub value: String,
    /// Gas price in gwei, fixed two decimal places.
    pub gas_price: String,
    pub gas: u64,
    pub nonce: u64,
    pub block_number: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub block_number: u64,
    pub gas_price: String,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPricePoint {
    pub block_number: u64,
    pub gas_price: f64,
    /// Wall-clock time the sample was taken, milliseconds since the epoch.
    pub timestamp: i64,
}

/// Synthetic pending-pool figures; see [`crate::mempool`] for how these are
/// produced. Not derived from a real node's mempool.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MempoolStats {
    pub pending_count: u64,
    pub avg_gas_price: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    pub usd: f64,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    /// Milliseconds since the epoch; 0 until the first successful fetch.
    pub last_update: i64,
}

/// The full aggregated view served to the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub block: BlockSummary,
    pub transactions: Vec<TxSummary>,
    pub network_info: NetworkInfo,
    /// Newest block first.
    pub block_history: Vec<BlockSummary>,
    /// Newest sample first.
    pub gas_price_history: Vec<GasPricePoint>,
    pub mempool_stats: MempoolStats,
    pub eth_price: PriceInfo,
    /// Milliseconds since the epoch of the last successful refresh; 0 if none.
    pub last_update: i64,
}

/// Decoded ERC-20 `Transfer` event pulled from a receipt log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub token: String,
    pub from: String,
    pub to: String,
    /// Raw transfer amount as a decimal string.
    pub value: String,
    /// Amount divided by 1e18, fixed six decimal places.
    pub value_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas_price: String,
    pub gas: u64,
    pub nonce: u64,
    pub block_number: Option<u64>,
    /// "success", "failed" or "pending" (no receipt yet).
    pub status: String,
    pub is_contract_creation: bool,
    pub is_contract_interaction: bool,
    pub token_transfers: Vec<TokenTransfer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletReport {
    pub address: String,
    /// Balance in ether, fixed six decimal places.
    pub balance: String,
    /// Lifetime outgoing transaction count (`eth_getTransactionCount`).
    pub tx_count: u64,
    /// Matches found in the scan window, newest block first.
    pub transactions: Vec<TxSummary>,
    pub blocks_scanned: u64,
    /// Explains truncation or an empty scan; null when neither applies.
    pub note: Option<String>,
}
