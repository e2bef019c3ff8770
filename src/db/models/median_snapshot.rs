use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cross-pool median APY snapshot (PostgreSQL `median` table).
///
/// Append only, one row per timestamp (uniqueness enforced by the
/// database). The row id is generated on insert.
///
/// Query Pattern: "Get median APY history for the overview chart"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianSnapshot {
    /// Number of distinct pools contributing to the median.
    pub unique_pools: i32,
    pub median_apy: f64,
    pub timestamp: DateTime<Utc>,
}

impl MedianSnapshot {
    pub fn new(unique_pools: i32, median_apy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            unique_pools,
            median_apy,
            timestamp,
        }
    }
}
