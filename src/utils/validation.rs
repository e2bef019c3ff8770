//! Observation admission checks.
//!
//! Bounds are wide enough for legitimate extremes while catching
//! adapter bugs:
//!
//! 1. TVL: the largest DeFi pools hold tens of billions of USD. A pool
//!    reporting $100B+ is almost certainly a unit error.
//!
//! 2. APY: short-lived farm incentives can reach thousands of percent,
//!    but 1,000,000%+ indicates a misplaced decimal.
//!
//! Ordering is checked here as well: the yield table is append only and
//! strictly increasing in timestamp per pool, so a stale observation is
//! rejected rather than silently reordered.

use chrono::{DateTime, Utc};

use crate::db::models::NewObservation;
use crate::error::StoreError;

/// Maximum reasonable TVL in USD for a single pool.
pub const MAX_TVL_USD: i64 = 100_000_000_000;

/// Maximum reasonable APY magnitude in percent.
pub const MAX_APY_PCT: f64 = 1e6;

/// Validate an incoming observation against the pool's latest persisted
/// timestamp. Any failure rejects the observation before it touches the
/// yield or stat tables.
pub fn validate_observation(
    obs: &NewObservation,
    latest: Option<DateTime<Utc>>,
) -> Result<(), StoreError> {
    if obs.tvl_usd < 0 {
        return Err(StoreError::InvalidInput(format!(
            "negative tvl_usd: {}",
            obs.tvl_usd
        )));
    }
    if obs.tvl_usd > MAX_TVL_USD {
        return Err(StoreError::InvalidInput(format!(
            "tvl_usd {} exceeds sanity bound {}",
            obs.tvl_usd, MAX_TVL_USD
        )));
    }

    if !obs.apy.is_finite() || obs.apy.abs() > MAX_APY_PCT {
        return Err(StoreError::InvalidInput(format!(
            "apy out of range: {}",
            obs.apy
        )));
    }
    for (name, value) in [("apy_base", obs.apy_base), ("apy_reward", obs.apy_reward)] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(StoreError::InvalidInput(format!(
                    "{name} is not finite: {v}"
                )));
            }
        }
    }

    if let Some(latest) = latest {
        if obs.timestamp <= latest {
            return Err(StoreError::InvalidInput(format!(
                "out-of-order observation: {} is not after latest {}",
                obs.timestamp, latest
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(timestamp: DateTime<Utc>) -> NewObservation {
        NewObservation {
            timestamp,
            tvl_usd: 1_000_000,
            apy: 2.5,
            apy_base: Some(2.0),
            apy_reward: Some(0.5),
        }
    }

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 8, 26, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_observation_passes() {
        assert!(validate_observation(&obs(ts(1)), None).is_ok());
        assert!(validate_observation(&obs(ts(2)), Some(ts(1))).is_ok());
    }

    #[test]
    fn test_negative_tvl_rejected() {
        let mut o = obs(ts(1));
        o.tvl_usd = -1;
        assert!(matches!(
            validate_observation(&o, None),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_finite_apy_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut o = obs(ts(1));
            o.apy = bad;
            assert!(matches!(
                validate_observation(&o, None),
                Err(StoreError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_non_finite_components_rejected() {
        let mut o = obs(ts(1));
        o.apy_reward = Some(f64::NAN);
        assert!(matches!(
            validate_observation(&o, None),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_out_of_order_timestamp_rejected() {
        // Earlier than latest
        assert!(matches!(
            validate_observation(&obs(ts(1)), Some(ts(2))),
            Err(StoreError::InvalidInput(_))
        ));
        // Equal to latest: re-feeding the same hour is also rejected
        assert!(matches!(
            validate_observation(&obs(ts(2)), Some(ts(2))),
            Err(StoreError::InvalidInput(_))
        ));
    }
}
