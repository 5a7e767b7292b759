//! Descriptive statistics for per-distance sample columns.
//!
//! The same aggregator is applied to range, RSSI and both power estimates.
//! Variance and standard deviation are sample statistics (divisor `n - 1`).

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Calculate a percentile value from a slice of f64 samples.
///
/// Uses linear interpolation between nearest ranks, so the 50th percentile
/// of an even-length slice is the average of the two middle values.
///
/// # Returns
///
/// * `Some(value)` - The percentile value
/// * `None` - If samples is empty or p is outside 0..=100
///
/// # Examples
///
/// ```
/// use uwb_stats::stats::descriptive::percentile;
///
/// let data = vec![1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile(&data, 50.0), Some(2.5));
/// ```
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower_index = rank.floor() as usize;
    let upper_index = rank.ceil() as usize;

    if lower_index == upper_index {
        Some(sorted[lower_index])
    } else {
        let lower_value = sorted[lower_index];
        let upper_value = sorted[upper_index];
        let fraction = rank - lower_index as f64;
        Some(lower_value + fraction * (upper_value - lower_value))
    }
}

fn require_samples(samples: &[f64]) -> Result<(), StatsError> {
    if samples.is_empty() {
        return Err(StatsError::InvalidInput(
            "Statistics requested over an empty sequence".to_string(),
        ));
    }
    Ok(())
}

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Result<f64, StatsError> {
    require_samples(samples)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Median, averaging the two middle values for even lengths.
pub fn median(samples: &[f64]) -> Result<f64, StatsError> {
    require_samples(samples)?;
    percentile(samples, 50.0).ok_or_else(|| {
        StatsError::InvalidInput("Median undefined for the given sequence".to_string())
    })
}

/// Sample variance (Bessel-corrected).
pub fn variance(samples: &[f64]) -> Result<f64, StatsError> {
    if samples.len() < 2 {
        return Err(StatsError::InsufficientSamples {
            required: 2,
            actual: samples.len(),
        });
    }
    let mean = mean(samples)?;
    let squared_diffs: f64 = samples.iter().map(|&x| (x - mean).powi(2)).sum();
    Ok(squared_diffs / (samples.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn std_dev(samples: &[f64]) -> Result<f64, StatsError> {
    variance(samples).map(f64::sqrt)
}

/// Point estimates for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub count: usize,
}

impl Summary {
    /// Compute every point estimate from samples.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - If samples is empty
    /// * `InsufficientSamples` - If there is only one sample
    ///
    /// # Examples
    ///
    /// ```
    /// use uwb_stats::stats::Summary;
    ///
    /// let summary = Summary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    /// assert_eq!(summary.mean, 5.0);
    /// assert_eq!(summary.median, 4.5);
    /// ```
    pub fn from_samples(samples: &[f64]) -> Result<Self, StatsError> {
        let variance = variance(samples)?;
        Ok(Summary {
            mean: mean(samples)?,
            median: median(samples)?,
            std_dev: variance.sqrt(),
            variance,
            count: samples.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_empty_samples() {
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_invalid_p() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(percentile(&samples, -1.0), None);
        assert_eq!(percentile(&samples, 101.0), None);
    }

    #[test]
    fn test_percentile_with_interpolation() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let p25 = percentile(&samples, 25.0).unwrap();
        assert!((p25 - 3.25).abs() < 1e-10);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[5.0, 1.0, 3.0]).unwrap(), 3.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[-80.0]).unwrap(), -80.0);
    }

    #[test]
    fn test_mean_single_sample() {
        assert_eq!(mean(&[10.3]).unwrap(), 10.3);
    }

    #[test]
    fn test_empty_sequence_is_invalid_input() {
        assert!(matches!(mean(&[]), Err(StatsError::InvalidInput(_))));
        assert!(matches!(median(&[]), Err(StatsError::InvalidInput(_))));
    }

    #[test]
    fn test_variance_needs_two_samples() {
        assert_eq!(
            variance(&[1.0]),
            Err(StatsError::InsufficientSamples {
                required: 2,
                actual: 1
            })
        );
        assert_eq!(
            std_dev(&[]),
            Err(StatsError::InsufficientSamples {
                required: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn test_summary_known_values() {
        let samples = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let summary = Summary::from_samples(&samples).unwrap();

        assert_eq!(summary.count, 8);
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.median, 4.5);
        assert!((summary.variance - 32.0 / 7.0).abs() < 1e-10);
        assert!((summary.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_summary_single_sample_fails() {
        assert!(matches!(
            Summary::from_samples(&[42.0]),
            Err(StatsError::InsufficientSamples { .. })
        ));
    }

    proptest! {
        /// Property: stddev squared equals variance within tolerance
        #[test]
        fn std_dev_squared_is_variance(
            samples in prop::collection::vec(-1.0e4f64..1.0e4, 2..64),
        ) {
            let summary = Summary::from_samples(&samples).unwrap();
            let tolerance = 1e-9 * summary.variance.max(1.0);
            prop_assert!((summary.std_dev.powi(2) - summary.variance).abs() <= tolerance);
        }

        /// Property: mean is the arithmetic average and lies within the range
        #[test]
        fn mean_lies_within_bounds(
            samples in prop::collection::vec(-1.0e4f64..1.0e4, 1..64),
        ) {
            let m = mean(&samples).unwrap();
            let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= min - 1e-9 && m <= max + 1e-9);
        }

        /// Property: median matches the sorted even/odd definition
        #[test]
        fn median_matches_sorted_definition(
            samples in prop::collection::vec(-1.0e4f64..1.0e4, 1..64),
        ) {
            let mut sorted = samples.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let n = sorted.len();
            let expected = if n % 2 == 0 {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            } else {
                sorted[n / 2]
            };
            let actual = median(&samples).unwrap();
            prop_assert!((actual - expected).abs() < 1e-9);
        }
    }
}
