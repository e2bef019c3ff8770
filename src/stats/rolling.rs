//! Single-pass rolling moments for per-pool yield series.
//!
//! Each accepted observation advances the pool's stored moments without
//! re-reading history: Welford mean/M2 for APY and daily return, plus a
//! running product of (1 + daily return) terms for compounding. Memory is
//! O(1) per pool regardless of history length, and the results match
//! batch mean/variance over the full series within floating-point
//! tolerance.

use chrono::Utc;
use uuid::Uuid;

use crate::db::models::RollingStat;

/// Daily compounding rate implied by an annualized percentage yield.
///
/// `r = (1 + apy/100)^(1/365) - 1`
///
/// Returns `None` when the APY is at or below -100%: the annual growth
/// factor is non-positive and no real daily rate exists. Callers skip
/// the return-side update for such periods.
pub fn implied_daily_return(apy: f64) -> Option<f64> {
    let growth = 1.0 + apy / 100.0;
    if growth > 0.0 {
        Some(growth.powf(1.0 / 365.0) - 1.0)
    } else {
        None
    }
}

/// Moments after a pool's first accepted observation.
///
/// The M2 accumulators start at zero. Without a daily return the product
/// starts at 1, the return mean at 0 and the return-sample count at 0.
pub fn first(stat_id: Uuid, apy: f64, daily_return: Option<f64>) -> RollingStat {
    RollingStat {
        stat_id,
        count: 1,
        count_dr: daily_return.is_some() as i32,
        mean_apy: apy,
        mean2_apy: 0.0,
        mean_dr: daily_return.unwrap_or(0.0),
        mean2_dr: 0.0,
        product_dr: daily_return.map_or(1.0, |r| 1.0 + r),
        updated_at: Utc::now(),
    }
}

/// Welford update for one new observation.
///
/// A `None` daily return skips the return-side moments and the product
/// for this step; the APY side always advances. The two sides keep
/// separate sample counts so a skipped period never skews the divisor
/// of later return-side updates.
pub fn advance(prev: &RollingStat, apy: f64, daily_return: Option<f64>) -> RollingStat {
    let count = prev.count + 1;
    let n = count as f64;

    let delta = apy - prev.mean_apy;
    let mean_apy = prev.mean_apy + delta / n;
    let mean2_apy = prev.mean2_apy + delta * (apy - mean_apy);

    let (count_dr, mean_dr, mean2_dr, product_dr) = match daily_return {
        Some(r) => {
            let count_dr = prev.count_dr + 1;
            let delta_dr = r - prev.mean_dr;
            let mean_dr = prev.mean_dr + delta_dr / count_dr as f64;
            let mean2_dr = prev.mean2_dr + delta_dr * (r - mean_dr);
            (count_dr, mean_dr, mean2_dr, prev.product_dr * (1.0 + r))
        }
        None => (
            prev.count_dr,
            prev.mean_dr,
            prev.mean2_dr,
            prev.product_dr,
        ),
    };

    RollingStat {
        stat_id: prev.stat_id,
        count,
        count_dr,
        mean_apy,
        mean2_apy,
        mean_dr,
        mean2_dr,
        product_dr,
        updated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REL_TOLERANCE: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= REL_TOLERANCE * scale,
            "expected {expected}, got {actual}"
        );
    }

    fn feed(apys: &[f64]) -> RollingStat {
        let mut stat = first(
            Uuid::new_v4(),
            apys[0],
            implied_daily_return(apys[0]),
        );
        for &apy in &apys[1..] {
            stat = advance(&stat, apy, implied_daily_return(apy));
        }
        stat
    }

    fn batch_mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn batch_variance(values: &[f64]) -> f64 {
        let mean = batch_mean(values);
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_first_observation_initializes_moments() {
        let id = Uuid::new_v4();
        let r = implied_daily_return(5.0).unwrap();
        let stat = first(id, 5.0, Some(r));

        assert_eq!(stat.stat_id, id);
        assert_eq!(stat.count, 1);
        assert_eq!(stat.count_dr, 1);
        assert_eq!(stat.mean_apy, 5.0);
        assert_eq!(stat.mean2_apy, 0.0);
        assert_eq!(stat.mean_dr, r);
        assert_eq!(stat.mean2_dr, 0.0);
        assert_eq!(stat.product_dr, 1.0 + r);
    }

    #[test]
    fn test_incremental_matches_batch_statistics() {
        // Deliberately noisy series with spikes and negative yields
        let apys = [
            2.0, 2.3, 1.7, 4.9, 0.2, 12.5, 11.8, 0.01, 3.33, 2.71, 8.0, 7.5,
            -0.5, 0.0, 150.0, 2.0, 2.0, 5.25, 6.125, 1.875,
        ];
        let stat = feed(&apys);

        assert_eq!(stat.count as usize, apys.len());
        assert_eq!(stat.count_dr as usize, apys.len());
        assert_close(stat.mean_apy, batch_mean(&apys));
        assert_close(stat.apy_variance(), batch_variance(&apys));

        let returns: Vec<f64> = apys
            .iter()
            .map(|&a| implied_daily_return(a).unwrap())
            .collect();
        assert_close(stat.mean_dr, batch_mean(&returns));
        assert_close(stat.dr_variance(), batch_variance(&returns));
        assert_close(
            stat.product_dr,
            returns.iter().map(|r| 1.0 + r).product::<f64>(),
        );
    }

    #[test]
    fn test_count_increments_by_exactly_one_per_observation() {
        // Re-feeding the same value is two distinct observations, not a no-op
        let mut stat = first(Uuid::new_v4(), 2.0, implied_daily_return(2.0));
        assert_eq!(stat.count, 1);
        stat = advance(&stat, 2.0, implied_daily_return(2.0));
        assert_eq!(stat.count, 2);
        stat = advance(&stat, 2.0, implied_daily_return(2.0));
        assert_eq!(stat.count, 3);
    }

    #[test]
    fn test_aave_usdc_three_hourly_updates() {
        let apys = [2.0, 2.2, 1.8];
        let stat = feed(&apys);

        assert_eq!(stat.count, 3);
        assert_close(stat.mean_apy, 2.0);

        let expected_product: f64 = apys
            .iter()
            .map(|&a| 1.0 + implied_daily_return(a).unwrap())
            .product();
        assert_close(stat.product_dr, expected_product);
        assert!(stat.compounded_return() > 0.0);
    }

    #[test]
    fn test_missing_return_skips_return_side() {
        let stat = first(Uuid::new_v4(), 3.0, None);
        assert_eq!(stat.count_dr, 0);
        assert_eq!(stat.mean_dr, 0.0);
        assert_eq!(stat.product_dr, 1.0);

        let before = stat.clone();
        let after = advance(&stat, 4.0, None);

        // APY side advanced, return side untouched
        assert_eq!(after.count, 2);
        assert_close(after.mean_apy, 3.5);
        assert_eq!(after.count_dr, 0);
        assert_eq!(after.mean_dr, before.mean_dr);
        assert_eq!(after.mean2_dr, before.mean2_dr);
        assert_eq!(after.product_dr, before.product_dr);
    }

    #[test]
    fn test_return_side_matches_batch_after_skipped_step() {
        // An APY at or below total loss has no derivable daily return,
        // so the first step contributes no return sample. The return
        // side must still equal batch statistics over the returns that
        // were observed afterwards.
        let mut stat = first(Uuid::new_v4(), -150.0, implied_daily_return(-150.0));
        assert_eq!(stat.count_dr, 0);

        let apys = [2.0, 3.0, 1.5];
        for &apy in &apys {
            stat = advance(&stat, apy, implied_daily_return(apy));
        }

        assert_eq!(stat.count, 4);
        assert_eq!(stat.count_dr as usize, apys.len());

        let returns: Vec<f64> = apys
            .iter()
            .map(|&a| implied_daily_return(a).unwrap())
            .collect();
        assert_close(stat.mean_dr, batch_mean(&returns));
        assert_close(stat.dr_variance(), batch_variance(&returns));
        assert_close(
            stat.product_dr,
            returns.iter().map(|r| 1.0 + r).product::<f64>(),
        );
    }

    #[test]
    fn test_implied_daily_return() {
        // 0% APY compounds to a zero daily rate
        assert_close(implied_daily_return(0.0).unwrap(), 0.0);

        // Compounding the daily rate back over a year recovers the APY
        let r = implied_daily_return(10.0).unwrap();
        assert_close((1.0 + r).powi(365), 1.10);

        // No real daily rate at or below total loss
        assert!(implied_daily_return(-100.0).is_none());
        assert!(implied_daily_return(-250.0).is_none());
    }
}
