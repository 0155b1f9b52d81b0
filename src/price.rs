use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cache::{now_millis, SnapshotCache};
use crate::models::PriceInfo;

/// How stale the cached price may get before a refresh is attempted.
pub const PRICE_MAX_AGE: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct PriceQuote {
    usd: f64,
    usd_24h_change: f64,
}

/// Fetches the fiat price feed, on a lifecycle independent of chain polling.
#[derive(Clone)]
pub struct PriceFetcher {
    http: reqwest::Client,
    url: String,
    asset_id: String,
}

impl PriceFetcher {
    pub fn new(url: String, asset_id: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build price feed client")?;
        Ok(Self {
            http,
            url,
            asset_id,
        })
    }

    pub async fn fetch(&self) -> Result<PriceInfo> {
        let quotes: HashMap<String, PriceQuote> = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("price feed request failed")?
            .error_for_status()
            .context("price feed returned an error status")?
            .json()
            .await
            .context("price feed returned malformed JSON")?;

        let quote = quotes
            .get(&self.asset_id)
            .with_context(|| format!("price feed missing asset {:?}", self.asset_id))?;

        Ok(PriceInfo {
            usd: quote.usd,
            change_24h: quote.usd_24h_change,
            last_update: now_millis(),
        })
    }

    /// Refresh the cached price if it is older than [`PRICE_MAX_AGE`]. On
    /// failure the previous value stays in place (the zero placeholder if no
    /// fetch has ever succeeded).
    pub async fn refresh_if_stale(&self, cache: &SnapshotCache) {
        if cache.price_age().await <= PRICE_MAX_AGE {
            return;
        }
        match self.fetch().await {
            Ok(price) => cache.set_price(price).await,
            Err(err) => tracing::warn!("price refresh failed, keeping last value: {:#}", err),
        }
    }
}
