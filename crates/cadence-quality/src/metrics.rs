//! Score aggregation
//!
//! Pure reductions used after gateway fan-in: means, population variance and
//! weighted sums with a checked weight total.

use crate::score::{clamp_unit, ScoreError};

/// Maximum distance from 1.0 tolerated for a weight set
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Arithmetic mean of the samples
pub fn mean(samples: &[f64]) -> Result<f64, ScoreError> {
    if samples.is_empty() {
        return Err(ScoreError::Empty("mean".to_string()));
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population variance of the samples
pub fn variance(samples: &[f64]) -> Result<f64, ScoreError> {
    let m = mean(samples)?;
    Ok(samples.iter().map(|s| (s - m).powi(2)).sum::<f64>() / samples.len() as f64)
}

/// Σ(score × weight), clamped; the weights must sum to 1.0
pub fn weighted_sum(pairs: &[(f64, f64)]) -> Result<f64, ScoreError> {
    if pairs.is_empty() {
        return Err(ScoreError::Empty("weighted_sum".to_string()));
    }
    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    if (total_weight - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ScoreError::WeightSum(total_weight));
    }
    Ok(clamp_unit(pairs.iter().map(|(s, w)| s * w).sum()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let samples = [0.5, 1.0, 0.0, 0.5];
        assert!((mean(&samples).unwrap() - 0.5).abs() < 1e-12);
        assert!((variance(&samples).unwrap() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_nothing_is_an_error() {
        assert!(matches!(mean(&[]), Err(ScoreError::Empty(_))));
    }

    #[test]
    fn test_weighted_sum_rejects_bad_weights() {
        let err = weighted_sum(&[(1.0, 0.5), (1.0, 0.4)]).unwrap_err();
        assert!(matches!(err, ScoreError::WeightSum(_)));
    }

    #[test]
    fn test_weighted_sum() {
        let value = weighted_sum(&[(0.8, 0.25), (0.4, 0.75)]).unwrap();
        assert!((value - 0.5).abs() < 1e-12);
    }
}
