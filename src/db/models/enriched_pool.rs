use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enrichment output per pool (PostgreSQL `enriched` table).
///
/// `enriched_id` equals the pool's `config_id`. Written by the external
/// enrichment collaborator and overwritten in place on each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPool {
    pub enriched_id: Uuid,

    // Percent change of APY over trailing windows
    pub apy_pct_1d: Option<f64>,
    pub apy_pct_7d: Option<f64>,
    pub apy_pct_30d: Option<f64>,

    // Classifications
    pub stablecoin: bool,
    pub il_risk: String,
    pub exposure: String,

    /// Structured prediction payload (model class, confidence, etc.).
    pub predictions: serde_json::Value,

    // Distribution parameters and expanding stats
    pub mu: f64,
    pub sigma: f64,
    pub count: i16,
    pub outlier: bool,
    pub latest_return: f64,
    pub apy_mean_expanding: f64,
    pub apy_std_expanding: f64,

    // Categorical encodings used as ML features
    pub chain_factorized: i16,
    pub project_factorized: i16,

    pub updated_at: DateTime<Utc>,
}
