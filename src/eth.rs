use anyhow::{Context, Result};
use ethers_core::types::{Address, Block, BlockId, Transaction, H256, U256};
use ethers_providers::{Http, Middleware, Provider};
use url::Url;

use crate::erc20;
use crate::models::{
    BlockSummary, TransactionDetail, TxSummary, WalletReport, CONTRACT_CREATION,
};
use crate::units::{format_ether, format_gwei};

/// How far back a wallet scan walks from the chain head.
pub const WALLET_SCAN_WINDOW: u64 = 100;

/// Thin wrapper over a single upstream JSON-RPC endpoint. Stateless; safe to
/// clone into handlers and background tasks.
#[derive(Clone)]
pub struct EthClient {
    provider: Provider<Http>,
}

impl EthClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .context("failed to build reqwest client")?;
        let url = Url::parse(rpc_url).context("invalid ETH_RPC_URL")?;
        let transport = Http::new_with_client(url, client);
        let provider = Provider::new(transport);
        Ok(Self { provider })
    }

    pub async fn latest_block_number(&self) -> Result<u64> {
        let number = self
            .provider
            .get_block_number()
            .await
            .context("failed to fetch latest block number")?;
        Ok(number.as_u64())
    }

    pub async fn block_with_txs(&self, number: u64) -> Result<Option<Block<Transaction>>> {
        self.provider
            .get_block_with_txs(BlockId::Number(number.into()))
            .await
            .with_context(|| format!("failed to fetch block {}", number))
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.provider
            .get_gas_price()
            .await
            .context("failed to fetch gas price")
    }

    /// Request-scoped lookup backing `/transaction/:hash`; does not touch the
    /// snapshot cache. `None` means the upstream has never seen the hash.
    pub async fn transaction_detail(&self, hash: H256) -> Result<Option<TransactionDetail>> {
        let Some(tx) = self
            .provider
            .get_transaction(hash)
            .await
            .with_context(|| format!("failed to fetch transaction {:?}", hash))?
        else {
            return Ok(None);
        };

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .with_context(|| format!("failed to fetch receipt for {:?}", hash))?;

        let status = match &receipt {
            // Pre-Byzantium receipts carry no status field; report success.
            Some(r) => match r.status.map(|s| s.as_u64()) {
                Some(0) => "failed",
                _ => "success",
            },
            None => "pending",
        };
        let token_transfers = receipt
            .as_ref()
            .map(|r| erc20::decode_transfers(&r.logs))
            .unwrap_or_default();

        let is_contract_creation = tx.to.is_none();
        let is_contract_interaction = !is_contract_creation && !tx.input.is_empty();

        Ok(Some(TransactionDetail {
            hash: format!("0x{:x}", tx.hash),
            from: address_to_lower_hex(tx.from),
            to: tx
                .to
                .map(address_to_lower_hex)
                .unwrap_or_else(|| CONTRACT_CREATION.to_string()),
            value: format_ether(tx.value),
            gas_price: format_gwei(effective_gas_price(&tx)),
            gas: u256_to_u64_lossy(tx.gas),
            nonce: u256_to_u64_lossy(tx.nonce),
            block_number: tx.block_number.map(|n| n.as_u64()),
            status: status.to_string(),
            is_contract_creation,
            is_contract_interaction,
            token_transfers,
        }))
    }

    /// Request-scoped wallet report backing `/wallet/:address`. The
    /// transaction list is a best-effort scan over the most recent blocks;
    /// individual block fetch failures are logged and skipped so one flaky
    /// response does not sink the whole report.
    pub async fn scan_wallet(&self, address: Address, limit: usize) -> Result<WalletReport> {
        let balance = self
            .provider
            .get_balance(address, None)
            .await
            .context("failed to fetch balance")?;
        let tx_count = self
            .provider
            .get_transaction_count(address, None)
            .await
            .context("failed to fetch transaction count")?;
        let latest = self.latest_block_number().await?;

        let window = WALLET_SCAN_WINDOW.min(latest + 1);
        let mut matches: Vec<TxSummary> = Vec::new();
        let mut truncated = false;

        'scan: for offset in 0..window {
            let number = latest - offset;
            let block = match self.block_with_txs(number).await {
                Ok(Some(block)) => block,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!("wallet scan skipping block {}: {:#}", number, err);
                    continue;
                }
            };
            for tx in &block.transactions {
                if tx.from != address && tx.to != Some(address) {
                    continue;
                }
                match normalize_tx(tx, number) {
                    Ok(summary) => matches.push(summary),
                    Err(err) => {
                        tracing::warn!("skipping malformed transaction {:?}: {:#}", tx.hash, err)
                    }
                }
                if matches.len() >= limit {
                    truncated = true;
                    break 'scan;
                }
            }
        }

        let note = if truncated {
            Some(format!(
                "showing the first {} matches from the most recent {} blocks",
                limit, window
            ))
        } else if matches.is_empty() && !tx_count.is_zero() {
            Some(format!(
                "no transactions found in the most recent {} blocks; older activity is not scanned",
                window
            ))
        } else {
            None
        };

        Ok(WalletReport {
            address: address_to_lower_hex(address),
            balance: format_ether(balance),
            tx_count: u256_to_u64_lossy(tx_count),
            transactions: matches,
            blocks_scanned: window,
            note,
        })
    }
}

/// `None` when the block is still pending (no number or hash yet).
pub fn normalize_block(block: &Block<Transaction>) -> Option<BlockSummary> {
    let number = block.number?.as_u64();
    let hash = block.hash?;

    Some(BlockSummary {
        number,
        hash: format!("0x{:x}", hash),
        timestamp: block.timestamp.as_u64(),
        transactions: block
            .transactions
            .iter()
            .map(|tx| format!("0x{:x}", tx.hash))
            .collect(),
        gas_used: u256_to_u64_lossy(block.gas_used),
        gas_limit: u256_to_u64_lossy(block.gas_limit),
        miner: block
            .author
            .map(address_to_lower_hex)
            .unwrap_or_else(|| address_to_lower_hex(Address::zero())),
        difficulty: block.difficulty.to_string(),
        transaction_count: block.transactions.len(),
    })
}

pub fn normalize_tx(tx: &Transaction, block_number: u64) -> Result<TxSummary> {
    let gas = u64::try_from(tx.gas).map_err(|_| anyhow::anyhow!("gas exceeds u64"))?;
    let nonce = u64::try_from(tx.nonce).map_err(|_| anyhow::anyhow!("nonce exceeds u64"))?;

    Ok(TxSummary {
        hash: format!("0x{:x}", tx.hash),
        from: address_to_lower_hex(tx.from),
        to: tx
            .to
            .map(address_to_lower_hex)
            .unwrap_or_else(|| CONTRACT_CREATION.to_string()),
        value: format_ether(tx.value),
        gas_price: format_gwei(effective_gas_price(tx)),
        gas,
        nonce,
        block_number,
    })
}

/// Legacy transactions carry `gasPrice`; EIP-1559 transactions fall back to
/// `maxFeePerGas` for display purposes.
fn effective_gas_price(tx: &Transaction) -> U256 {
    tx.gas_price.or(tx.max_fee_per_gas).unwrap_or_default()
}

fn address_to_lower_hex(addr: Address) -> String {
    format!("0x{:x}", addr)
}

fn u256_to_u64_lossy(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::{H160, U64};

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::default();
        tx.hash = H256::from_low_u64_be(1);
        tx.from = H160::from_low_u64_be(2);
        tx.to = Some(H160::from_low_u64_be(3));
        tx.value = U256::exp10(18);
        tx.gas = U256::from(21_000u64);
        tx.nonce = U256::from(7u64);
        tx.gas_price = Some(U256::from(10_000_000_000u64));
        tx
    }

    #[test]
    fn normalize_legacy_tx_formats_units() {
        let summary = normalize_tx(&sample_tx(), 42).unwrap();
        assert_eq!(summary.value, "1.000000");
        assert_eq!(summary.gas_price, "10.00");
        assert_eq!(summary.block_number, 42);
        assert_eq!(summary.gas, 21_000);
    }

    #[test]
    fn normalize_eip1559_tx_uses_max_fee() {
        let mut tx = sample_tx();
        tx.gas_price = None;
        tx.max_fee_per_gas = Some(U256::from(2_000_000_000u64));

        let summary = normalize_tx(&tx, 11).unwrap();
        assert_eq!(summary.gas_price, "2.00");
    }

    #[test]
    fn contract_creation_uses_sentinel_recipient() {
        let mut tx = sample_tx();
        tx.to = None;
        let summary = normalize_tx(&tx, 1).unwrap();
        assert_eq!(summary.to, CONTRACT_CREATION);
    }

    #[test]
    fn normalize_tx_rejects_oversized_nonce() {
        let mut tx = sample_tx();
        tx.nonce = U256::MAX;
        assert!(normalize_tx(&tx, 1).is_err());
    }

    #[test]
    fn pending_block_is_not_normalized() {
        let block: Block<Transaction> = Block::default();
        assert!(normalize_block(&block).is_none());
    }

    #[test]
    fn mined_block_summary_matches_fields() {
        let mut block: Block<Transaction> = Block::default();
        block.number = Some(U64::from(100u64));
        block.hash = Some(H256::from_low_u64_be(9));
        block.timestamp = U256::from(1_700_000_000u64);
        block.gas_used = U256::from(12_000_000u64);
        block.gas_limit = U256::from(30_000_000u64);
        block.author = Some(H160::from_low_u64_be(5));
        block.transactions = vec![sample_tx()];

        let summary = normalize_block(&block).unwrap();
        assert_eq!(summary.number, 100);
        assert_eq!(summary.transaction_count, 1);
        assert_eq!(summary.transactions.len(), 1);
        assert_eq!(summary.gas_used, 12_000_000);
    }
}
