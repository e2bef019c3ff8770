use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming yield observation before it is persisted.
///
/// The row id is generated by the database on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservation {
    pub timestamp: DateTime<Utc>,
    /// Total value locked in whole USD.
    pub tvl_usd: i64,
    /// Annualized percentage yield, e.g. 2.5 for 2.5%.
    pub apy: f64,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
}

/// Persisted yield observation (PostgreSQL `yield` table).
///
/// Append only; rows are never mutated or deleted. Strictly increasing
/// timestamp per pool.
///
/// Query Pattern: "Get observation history for pool X since T"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub yield_id: Uuid,
    pub config_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub tvl_usd: i64,
    pub apy: f64,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
}
