use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::models::{NewObservation, PoolConfig};

/// One inbound sample from the ingestion collaborator: the pool's
/// metadata plus an hourly yield reading, delivered as one JSON object
/// per line.
///
/// Config fields ride along on every sample so a pool is created on
/// first sight and its metadata refreshed thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSample {
    pub pool: String,
    pub project: String,
    pub chain: String,
    pub symbol: String,
    #[serde(default)]
    pub pool_meta: Option<String>,
    #[serde(default)]
    pub underlying_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub reward_tokens: Option<Vec<String>>,
    pub url: String,

    pub timestamp: DateTime<Utc>,
    pub tvl_usd: i64,
    pub apy: f64,
    #[serde(default)]
    pub apy_base: Option<f64>,
    #[serde(default)]
    pub apy_reward: Option<f64>,
}

impl PoolSample {
    /// Split into the config upsert and the observation insert. The
    /// config carries a fresh id; on upsert-conflict the stored id wins.
    pub fn into_parts(self) -> (PoolConfig, NewObservation) {
        let config = PoolConfig::new(
            self.pool,
            self.project,
            self.chain,
            self.symbol,
            self.pool_meta,
            self.underlying_tokens,
            self.reward_tokens,
            self.url,
        );
        let observation = NewObservation {
            timestamp: self.timestamp,
            tvl_usd: self.tvl_usd,
            apy: self.apy,
            apy_base: self.apy_base,
            apy_reward: self.apy_reward,
        };
        (config, observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_sample() {
        let line = r#"{
            "pool": "aave-usdc",
            "project": "aave",
            "chain": "ethereum",
            "symbol": "USDC",
            "pool_meta": "v2 lending",
            "underlying_tokens": ["0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"],
            "reward_tokens": ["0x7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9"],
            "url": "https://app.aave.com",
            "timestamp": "2022-08-26T12:00:00Z",
            "tvl_usd": 450000000,
            "apy": 2.1,
            "apy_base": 1.8,
            "apy_reward": 0.3
        }"#;

        let sample: PoolSample = serde_json::from_str(line).unwrap();
        assert_eq!(sample.pool, "aave-usdc");
        assert_eq!(sample.tvl_usd, 450_000_000);
        assert_eq!(sample.apy_base, Some(1.8));
    }

    #[test]
    fn test_parse_minimal_sample() {
        // Optional metadata and APY decomposition may be absent entirely
        let line = r#"{
            "pool": "curve-3pool",
            "project": "curve",
            "chain": "ethereum",
            "symbol": "DAI-USDC-USDT",
            "url": "https://curve.fi",
            "timestamp": "2022-08-26T12:00:00Z",
            "tvl_usd": 900000000,
            "apy": 0.9
        }"#;

        let sample: PoolSample = serde_json::from_str(line).unwrap();
        assert!(sample.pool_meta.is_none());
        assert!(sample.underlying_tokens.is_none());
        assert!(sample.apy_base.is_none());
    }

    #[test]
    fn test_into_parts() {
        let sample = PoolSample {
            pool: "aave-usdc".to_string(),
            project: "aave".to_string(),
            chain: "ethereum".to_string(),
            symbol: "USDC".to_string(),
            pool_meta: None,
            underlying_tokens: None,
            reward_tokens: None,
            url: "https://app.aave.com".to_string(),
            timestamp: Utc::now(),
            tvl_usd: 1_000,
            apy: 2.0,
            apy_base: None,
            apy_reward: None,
        };

        let (config, obs) = sample.into_parts();
        assert_eq!(config.pool, "aave-usdc");
        assert_eq!(obs.tvl_usd, 1_000);
        assert_eq!(obs.apy, 2.0);
    }
}
