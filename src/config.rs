use std::env;

const DEFAULT_PRICE_FEED_URL: &str = "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=usd&include_24hr_change=true";

#[derive(Debug, Clone)]
pub struct Config {
    pub eth_rpc_url: String,
    pub http_bind_addr: String,
    pub price_feed_url: String,
    pub price_asset_id: String,
    pub poll_interval_secs: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing ETH_RPC_URL env var")]
    MissingEthRpcUrl,
    #[error("POLL_INTERVAL_SECS is not a positive integer: {0:?}")]
    InvalidPollInterval(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let eth_rpc_url = env::var("ETH_RPC_URL").map_err(|_| ConfigError::MissingEthRpcUrl)?;

        let http_bind_addr = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let price_feed_url =
            env::var("PRICE_FEED_URL").unwrap_or_else(|_| DEFAULT_PRICE_FEED_URL.to_string());
        let price_asset_id =
            env::var("PRICE_ASSET_ID").unwrap_or_else(|_| "ethereum".to_string());

        let poll_interval_secs = match env::var("POLL_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or(ConfigError::InvalidPollInterval(raw))?,
            Err(_) => 15,
        };

        Ok(Self {
            eth_rpc_url,
            http_bind_addr,
            price_feed_url,
            price_asset_id,
            poll_interval_secs,
        })
    }
}
