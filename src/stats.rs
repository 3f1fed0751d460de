//! Small numeric helpers shared by the scoring paths.
//!
//! Standard deviation here is the population form (divide by `n`), not the
//! sample form: PX-Values and stability both normalize over the full
//! observed cohort, and switching to `n - 1` would shift every score.

/// Round half away from zero to 2 decimal places.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round half away from zero to 1 decimal place.
#[inline]
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for an empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median; 0.0 for an empty slice. Even lengths average the middle pair.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_half_cases() {
        assert_eq!(round2(7.199999999999999), 7.2);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn round1_basic() {
        assert_eq!(round1(62.24), 62.2);
        assert_eq!(round1(62.25), 62.3);
    }

    #[test]
    fn mean_and_stddev_known_cohort() {
        let cohort = [3.0, 4.0, 5.0];
        assert_eq!(mean(&cohort), 4.0);
        // population form: sqrt(2/3)
        let sd = population_stddev(&cohort);
        assert!((sd - 0.816_496_580_927_726).abs() < 1e-12);
    }

    #[test]
    fn stddev_empty_and_single() {
        assert_eq!(population_stddev(&[]), 0.0);
        assert_eq!(population_stddev(&[4.2]), 0.0);
    }

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }
}
