/// Median of a set of APY values, `None` for an empty set.
///
/// Even-sized sets take the midpoint of the two central values. NaN
/// inputs are filtered out by validation before reaching this point,
/// so ordering treats incomparable values as equal.
pub fn median_apy(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median_apy(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median_apy(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_median_single_value() {
        assert_eq!(median_apy(&[7.25]), Some(7.25));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median_apy(&[]), None);
    }
}
