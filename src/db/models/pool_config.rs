use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static / semi-static pool metadata (PostgreSQL `config` table).
///
/// One row per unique pool key. Inserted on first sight of a pool,
/// updated in place on later sightings, never deleted.
///
/// Query Pattern: "Get config for pool key X"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Generated in the application, stable for the lifetime of the pool.
    pub config_id: Uuid,
    /// Unique pool key, e.g. "aave-usdc".
    pub pool: String,
    pub project: String,
    pub chain: String,
    pub symbol: String,
    pub pool_meta: Option<String>,
    pub underlying_tokens: Option<Vec<String>>,
    pub reward_tokens: Option<Vec<String>>,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

impl PoolConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: String,
        project: String,
        chain: String,
        symbol: String,
        pool_meta: Option<String>,
        underlying_tokens: Option<Vec<String>>,
        reward_tokens: Option<Vec<String>>,
        url: String,
    ) -> Self {
        Self {
            config_id: Uuid::new_v4(),
            pool,
            project,
            chain,
            symbol,
            pool_meta,
            underlying_tokens,
            reward_tokens,
            url,
            updated_at: Utc::now(),
        }
    }
}
