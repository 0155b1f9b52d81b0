//! Placeholder mempool statistics.
//!
//! The upstream endpoint gives no mempool visibility, so the figures here are
//! synthetic and non-authoritative. They sit behind [`MempoolSource`] so a
//! real pending-pool sampler can replace them without touching cache
//! consumers.

use rand::Rng;

use crate::models::MempoolStats;

pub trait MempoolSource: Send + Sync {
    /// Produce one set of pending-pool figures. `current_gas_gwei` is the
    /// real network gas price, mirrored into the synthetic output.
    fn sample(&self, current_gas_gwei: f64) -> MempoolStats;
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticMempool;

impl MempoolSource for SyntheticMempool {
    fn sample(&self, current_gas_gwei: f64) -> MempoolStats {
        let mut rng = rand::thread_rng();
        MempoolStats {
            pending_count: rng.gen_range(10_000..60_000),
            avg_gas_price: current_gas_gwei,
            total_value: rng.gen_range(50.0..150.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_within_documented_bounds() {
        let source = SyntheticMempool;
        for _ in 0..200 {
            let stats = source.sample(12.5);
            assert!((10_000..60_000).contains(&stats.pending_count));
            assert!((50.0..150.0).contains(&stats.total_value));
            assert_eq!(stats.avg_gas_price, 12.5);
        }
    }
}
