use chrono::{DateTime, Utc};
use log::{error, info};
use uuid::Uuid;

use crate::db::models::{
    EnrichedPool, MedianSnapshot, NewObservation, Observation, PoolConfig, RollingStat,
};
use crate::db::postgres::PostgresClient;
use crate::error::StoreError;
use crate::stats::{median_apy, rolling};
use crate::utils::validate_observation;

impl PostgresClient {
    // ==================== CONFIG ====================

    /// Insert a new pool config. A duplicate pool key fails with
    /// `ConstraintViolation`; use [`upsert_config`](Self::upsert_config)
    /// for the usual create-or-update path.
    pub async fn insert_config(&self, config: &PoolConfig) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO config (
                config_id, pool, project, chain, symbol,
                pool_meta, underlying_tokens, reward_tokens, url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#;

        client
            .execute(
                query,
                &[
                    &config.config_id,
                    &config.pool,
                    &config.project,
                    &config.chain,
                    &config.symbol,
                    &config.pool_meta,
                    &config.underlying_tokens,
                    &config.reward_tokens,
                    &config.url,
                ],
            )
            .await?;

        Ok(())
    }

    /// Insert a config on first sight of a pool, update it in place
    /// thereafter. The stored `config_id` is never replaced on conflict;
    /// the returned id is the one dependent rows must reference.
    pub async fn upsert_config(&self, config: &PoolConfig) -> Result<Uuid, StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO config (
                config_id, pool, project, chain, symbol,
                pool_meta, underlying_tokens, reward_tokens, url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (pool) DO UPDATE SET
                project = EXCLUDED.project,
                chain = EXCLUDED.chain,
                symbol = EXCLUDED.symbol,
                pool_meta = EXCLUDED.pool_meta,
                underlying_tokens = EXCLUDED.underlying_tokens,
                reward_tokens = EXCLUDED.reward_tokens,
                url = EXCLUDED.url
            RETURNING config_id
        "#;

        let row = client
            .query_one(
                query,
                &[
                    &config.config_id,
                    &config.pool,
                    &config.project,
                    &config.chain,
                    &config.symbol,
                    &config.pool_meta,
                    &config.underlying_tokens,
                    &config.reward_tokens,
                    &config.url,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to upsert config for pool {}: {:?}", config.pool, e);
                e
            })?;

        Ok(row.get("config_id"))
    }

    /// Get the config for a pool key
    pub async fn get_config(&self, pool: &str) -> Result<Option<PoolConfig>, StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT
                config_id, pool, project, chain, symbol,
                pool_meta, underlying_tokens, reward_tokens, url, updated_at
            FROM config
            WHERE pool = $1
        "#;

        let row = client.query_opt(query, &[&pool]).await?;
        Ok(row.map(|r| row_to_config(&r)))
    }

    // ==================== OBSERVATIONS & ROLLING STATS ====================

    /// Record one yield observation and advance the pool's rolling
    /// statistics in a single transaction.
    ///
    /// The config row is locked FOR UPDATE first, which serializes
    /// concurrent writers for the same pool while leaving other pools
    /// free to proceed. Validation failures (negative tvl, non-finite
    /// apy, out-of-order timestamp) roll the whole transaction back, so
    /// the yield and stat tables never diverge.
    pub async fn record_observation(
        &self,
        config_id: Uuid,
        obs: &NewObservation,
    ) -> Result<RollingStat, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let locked = tx
            .query_opt(
                "SELECT config_id FROM config WHERE config_id = $1 FOR UPDATE",
                &[&config_id],
            )
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound(format!(
                "no config for pool id {config_id}"
            )));
        }

        let latest: Option<DateTime<Utc>> = tx
            .query_one(
                "SELECT max(timestamp) FROM yield WHERE config_id = $1",
                &[&config_id],
            )
            .await?
            .get(0);

        validate_observation(obs, latest)?;

        tx.execute(
            r#"
            INSERT INTO yield (config_id, timestamp, tvl_usd, apy, apy_base, apy_reward)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            &[
                &config_id,
                &obs.timestamp,
                &obs.tvl_usd,
                &obs.apy,
                &obs.apy_base,
                &obs.apy_reward,
            ],
        )
        .await?;

        let prev = tx
            .query_opt(
                r#"
                SELECT stat_id, count, count_dr, mean_apy, mean2_apy, mean_dr,
                       mean2_dr, product_dr, updated_at
                FROM stat
                WHERE stat_id = $1
                "#,
                &[&config_id],
            )
            .await?
            .map(|r| row_to_stat(&r));

        let daily_return = rolling::implied_daily_return(obs.apy);
        let next = match prev {
            Some(prev) => rolling::advance(&prev, obs.apy, daily_return),
            None => rolling::first(config_id, obs.apy, daily_return),
        };

        tx.execute(
            r#"
            INSERT INTO stat (
                stat_id, count, count_dr, mean_apy, mean2_apy, mean_dr,
                mean2_dr, product_dr
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (stat_id) DO UPDATE SET
                count = EXCLUDED.count,
                count_dr = EXCLUDED.count_dr,
                mean_apy = EXCLUDED.mean_apy,
                mean2_apy = EXCLUDED.mean2_apy,
                mean_dr = EXCLUDED.mean_dr,
                mean2_dr = EXCLUDED.mean2_dr,
                product_dr = EXCLUDED.product_dr
            "#,
            &[
                &next.stat_id,
                &next.count,
                &next.count_dr,
                &next.mean_apy,
                &next.mean2_apy,
                &next.mean_dr,
                &next.mean2_dr,
                &next.product_dr,
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(next)
    }

    /// Get the rolling statistics for a pool
    pub async fn get_stat(&self, config_id: Uuid) -> Result<Option<RollingStat>, StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT stat_id, count, count_dr, mean_apy, mean2_apy, mean_dr,
                   mean2_dr, product_dr, updated_at
            FROM stat
            WHERE stat_id = $1
        "#;

        let row = client.query_opt(query, &[&config_id]).await?;
        Ok(row.map(|r| row_to_stat(&r)))
    }

    /// Get a pool's observation history in ascending timestamp order,
    /// optionally bounded below.
    pub async fn get_observations(
        &self,
        config_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT yield_id, config_id, timestamp, tvl_usd, apy, apy_base, apy_reward
            FROM yield
            WHERE config_id = $1
              AND ($2::timestamptz IS NULL OR timestamp >= $2)
            ORDER BY timestamp ASC
        "#;

        let rows = client.query(query, &[&config_id, &since]).await?;
        Ok(rows.iter().map(row_to_observation).collect())
    }

    // ==================== MEDIAN ====================

    /// Append a precomputed median snapshot. A duplicate timestamp fails
    /// with `ConstraintViolation`.
    pub async fn insert_median(&self, snapshot: &MedianSnapshot) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO median (unique_pools, median_apy, timestamp)
            VALUES ($1, $2, $3)
        "#;

        client
            .execute(
                query,
                &[
                    &snapshot.unique_pools,
                    &snapshot.median_apy,
                    &snapshot.timestamp,
                ],
            )
            .await?;

        Ok(())
    }

    /// Compute the median of each pool's latest APY and append it as a
    /// snapshot at `at`. Returns `None` when no observations exist yet.
    pub async fn record_median_snapshot(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<MedianSnapshot>, StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT DISTINCT ON (config_id) apy
            FROM yield
            ORDER BY config_id, timestamp DESC
        "#;

        let rows = client.query(query, &[]).await?;
        let apys: Vec<f64> = rows.iter().map(|r| r.get("apy")).collect();

        let Some(median) = median_apy(&apys) else {
            info!("No observations yet, skipping median snapshot");
            return Ok(None);
        };

        let snapshot = MedianSnapshot::new(apys.len() as i32, median, at);
        self.insert_median(&snapshot).await?;

        Ok(Some(snapshot))
    }

    // ==================== ENRICHED ====================

    /// Overwrite a pool's enrichment record in place. An unknown pool id
    /// surfaces as a `ConstraintViolation` from the foreign key.
    pub async fn upsert_enriched(&self, enriched: &EnrichedPool) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO enriched (
                enriched_id, apy_pct_1d, apy_pct_7d, apy_pct_30d, stablecoin,
                il_risk, exposure, predictions, mu, sigma, count, outlier,
                latest_return, apy_mean_expanding, apy_std_expanding,
                chain_factorized, project_factorized
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (enriched_id) DO UPDATE SET
                apy_pct_1d = EXCLUDED.apy_pct_1d,
                apy_pct_7d = EXCLUDED.apy_pct_7d,
                apy_pct_30d = EXCLUDED.apy_pct_30d,
                stablecoin = EXCLUDED.stablecoin,
                il_risk = EXCLUDED.il_risk,
                exposure = EXCLUDED.exposure,
                predictions = EXCLUDED.predictions,
                mu = EXCLUDED.mu,
                sigma = EXCLUDED.sigma,
                count = EXCLUDED.count,
                outlier = EXCLUDED.outlier,
                latest_return = EXCLUDED.latest_return,
                apy_mean_expanding = EXCLUDED.apy_mean_expanding,
                apy_std_expanding = EXCLUDED.apy_std_expanding,
                chain_factorized = EXCLUDED.chain_factorized,
                project_factorized = EXCLUDED.project_factorized
        "#;

        client
            .execute(
                query,
                &[
                    &enriched.enriched_id,
                    &enriched.apy_pct_1d,
                    &enriched.apy_pct_7d,
                    &enriched.apy_pct_30d,
                    &enriched.stablecoin,
                    &enriched.il_risk,
                    &enriched.exposure,
                    &enriched.predictions,
                    &enriched.mu,
                    &enriched.sigma,
                    &enriched.count,
                    &enriched.outlier,
                    &enriched.latest_return,
                    &enriched.apy_mean_expanding,
                    &enriched.apy_std_expanding,
                    &enriched.chain_factorized,
                    &enriched.project_factorized,
                ],
            )
            .await
            .map_err(|e| {
                error!(
                    "Failed to upsert enriched record {}: {:?}",
                    enriched.enriched_id, e
                );
                e
            })?;

        Ok(())
    }
}

// ==================== HELPER FUNCTIONS ====================

fn row_to_config(row: &tokio_postgres::Row) -> PoolConfig {
    PoolConfig {
        config_id: row.get("config_id"),
        pool: row.get("pool"),
        project: row.get("project"),
        chain: row.get("chain"),
        symbol: row.get("symbol"),
        pool_meta: row.get("pool_meta"),
        underlying_tokens: row.get("underlying_tokens"),
        reward_tokens: row.get("reward_tokens"),
        url: row.get("url"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_stat(row: &tokio_postgres::Row) -> RollingStat {
    RollingStat {
        stat_id: row.get("stat_id"),
        count: row.get("count"),
        count_dr: row.get("count_dr"),
        mean_apy: row.get("mean_apy"),
        mean2_apy: row.get("mean2_apy"),
        mean_dr: row.get("mean_dr"),
        mean2_dr: row.get("mean2_dr"),
        product_dr: row.get("product_dr"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_observation(row: &tokio_postgres::Row) -> Observation {
    Observation {
        yield_id: row.get("yield_id"),
        config_id: row.get("config_id"),
        timestamp: row.get("timestamp"),
        tvl_usd: row.get("tvl_usd"),
        apy: row.get("apy"),
        apy_base: row.get("apy_base"),
        apy_reward: row.get("apy_reward"),
    }
}
