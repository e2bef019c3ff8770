use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Online moments per pool (PostgreSQL `stat` table).
///
/// `stat_id` equals the pool's `config_id` (1:1 with config, no separate
/// generated key). Rewritten inside the observation transaction on every
/// accepted yield observation; see [`crate::stats::rolling`] for the
/// update formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingStat {
    pub stat_id: Uuid,
    /// Number of accepted observations.
    pub count: i32,
    /// Number of observations that carried a daily return. Lags `count`
    /// when return-less periods were skipped.
    pub count_dr: i32,
    /// Running mean of APY.
    pub mean_apy: f64,
    /// Running sum of squared APY deviations (Welford M2 accumulator).
    pub mean2_apy: f64,
    /// Running mean of the daily return.
    pub mean_dr: f64,
    /// Running M2 accumulator of the daily return.
    pub mean2_dr: f64,
    /// Running product of (1 + daily return) terms.
    pub product_dr: f64,
    pub updated_at: DateTime<Utc>,
}

impl RollingStat {
    /// Population variance of APY over the full accepted history.
    pub fn apy_variance(&self) -> f64 {
        if self.count > 0 {
            self.mean2_apy / self.count as f64
        } else {
            0.0
        }
    }

    /// Population variance of the daily return, over the observations
    /// that carried one.
    pub fn dr_variance(&self) -> f64 {
        if self.count_dr > 0 {
            self.mean2_dr / self.count_dr as f64
        } else {
            0.0
        }
    }

    /// Total compounded return implied by the running product.
    pub fn compounded_return(&self) -> f64 {
        self.product_dr - 1.0
    }
}
