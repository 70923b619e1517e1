use crate::error::{CoreError, Result};

/// Confidence threshold above which a corrupted vertex counts as
/// "recovered".
const RECOVERED_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Minimum average confidence over corrupted vertices required by
/// [`validate_recovery_quality`], independent of the caller-supplied
/// thresholds.
const MIN_CORRUPTED_AVERAGE_CONFIDENCE: f64 = 0.7;

/// Aggregate recovery quality signals, produced by
/// [`compute_recovery_metrics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryMetrics {
    pub total_vertices: u32,
    pub corrupted_count: u32,
    pub recovered_count: u32,
    pub average_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub average_confidence_corrupted: f64,
    pub recovery_rate: f64,
    pub corruption_percentage: f64,
}

/// Computes [`RecoveryMetrics`] from the final confidence vector and the
/// caller's corruption mask. `confidences` and `mask` must be the same
/// length.
pub fn compute_recovery_metrics(confidences: &[f64], mask: &[bool]) -> Result<RecoveryMetrics> {
    if confidences.len() != mask.len() {
        return Err(CoreError::ConfidencesMaskLengthMismatch {
            confidences: confidences.len(),
            mask: mask.len(),
        });
    }

    let total = confidences.len();
    if total == 0 {
        return Ok(RecoveryMetrics {
            total_vertices: 0,
            corrupted_count: 0,
            recovered_count: 0,
            average_confidence: 0.0,
            min_confidence: 0.0,
            max_confidence: 0.0,
            average_confidence_corrupted: 0.0,
            recovery_rate: 1.0,
            corruption_percentage: 0.0,
        });
    }

    let corrupted_count = mask.iter().filter(|&&m| m).count();
    let recovered_count = confidences
        .iter()
        .zip(mask.iter())
        .filter(|(&c, &m)| m && c > RECOVERED_CONFIDENCE_THRESHOLD)
        .count();

    let average_confidence = confidences.iter().sum::<f64>() / total as f64;
    let min_confidence = confidences.iter().copied().fold(f64::INFINITY, f64::min);
    let max_confidence = confidences
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let average_confidence_corrupted = if corrupted_count == 0 {
        0.0
    } else {
        confidences
            .iter()
            .zip(mask.iter())
            .filter(|(_, &m)| m)
            .map(|(&c, _)| c)
            .sum::<f64>()
            / corrupted_count as f64
    };

    let recovery_rate = if corrupted_count == 0 {
        1.0
    } else {
        recovered_count as f64 / corrupted_count as f64
    };

    Ok(RecoveryMetrics {
        total_vertices: total as u32,
        corrupted_count: corrupted_count as u32,
        recovered_count: recovered_count as u32,
        average_confidence,
        min_confidence,
        max_confidence,
        average_confidence_corrupted,
        recovery_rate,
        corruption_percentage: corrupted_count as f64 / total as f64,
    })
}

/// `true` iff the recovery rate, average confidence, and (when any vertex
/// is corrupted) average corrupted-vertex confidence all clear their
/// thresholds.
pub fn validate_recovery_quality(
    metrics: &RecoveryMetrics,
    min_recovery_rate: f64,
    min_average_confidence: f64,
) -> bool {
    let rate_ok = metrics.recovery_rate >= min_recovery_rate;
    let avg_ok = metrics.average_confidence >= min_average_confidence;
    let corrupted_ok = metrics.corrupted_count == 0
        || metrics.average_confidence_corrupted >= MIN_CORRUPTED_AVERAGE_CONFIDENCE;
    rate_ok && avg_ok && corrupted_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_mask_all_default_recovery() {
        // spec.md §8 boundary: empty corruption mask -> recovery rate 1.
        let confidences = [0.95, 0.95, 0.95];
        let mask = [false, false, false];
        let m = compute_recovery_metrics(&confidences, &mask).unwrap();
        assert_eq!(m.corrupted_count, 0);
        assert_relative_eq!(m.recovery_rate, 1.0);
        assert_relative_eq!(m.average_confidence, 0.95);
    }

    #[test]
    fn test_s6_validator_scenario() {
        let metrics = RecoveryMetrics {
            total_vertices: 100,
            corrupted_count: 20,
            recovered_count: 19,
            average_confidence: 0.85,
            min_confidence: 0.5,
            max_confidence: 1.0,
            average_confidence_corrupted: 0.75,
            recovery_rate: 0.95,
            corruption_percentage: 0.2,
        };
        assert!(validate_recovery_quality(&metrics, 0.9, 0.8));
        assert!(!validate_recovery_quality(&metrics, 0.9, 0.9));
    }

    #[test]
    fn test_validator_fails_on_low_corrupted_average() {
        let metrics = RecoveryMetrics {
            total_vertices: 10,
            corrupted_count: 5,
            recovered_count: 5,
            average_confidence: 0.9,
            min_confidence: 0.6,
            max_confidence: 1.0,
            average_confidence_corrupted: 0.65,
            recovery_rate: 1.0,
            corruption_percentage: 0.5,
        };
        assert!(!validate_recovery_quality(&metrics, 0.5, 0.5));
    }

    #[test]
    fn test_length_mismatch_errors() {
        assert!(compute_recovery_metrics(&[1.0], &[true, false]).is_err());
    }

    #[test]
    fn test_recovered_count_threshold_is_strict() {
        let confidences = [0.6, 0.60001];
        let mask = [true, true];
        let m = compute_recovery_metrics(&confidences, &mask).unwrap();
        assert_eq!(m.recovered_count, 1);
    }
}
