//! Synthetic progress for sessions the backend has not reported on
//!
//! A saturating exponential: `min(max_percent, round(100 * (1 - e^(-t / tau))))`.
//! It is a display heuristic only and always yields to reported progress.

use filing_common::config::ProgressConfig;

/// Step label thresholds, checked in order against the estimated percent
const STEP_LABELS: &[(u8, &str)] = &[
    (10, "Initializing"),
    (30, "Scanning document"),
    (60, "Analyzing content"),
    (80, "Extracting data"),
];
const FINAL_STEP_LABEL: &str = "Finalizing extraction";

/// Estimated progress at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEstimate {
    pub percent: u8,
    pub step: &'static str,
}

#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    tau_seconds: f64,
    max_percent: u8,
}

impl ProgressEstimator {
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            tau_seconds: config.tau_seconds,
            max_percent: config.max_percent.min(100),
        }
    }

    /// Estimate for `elapsed_seconds` since session creation
    ///
    /// Negative or NaN input reads as zero.
    pub fn estimate(&self, elapsed_seconds: f64) -> ProgressEstimate {
        let t = if elapsed_seconds.is_nan() {
            0.0
        } else {
            elapsed_seconds.max(0.0)
        };

        let raw = (100.0 * (1.0 - (-t / self.tau_seconds).exp())).round();
        let percent = raw.clamp(0.0, f64::from(self.max_percent)) as u8;

        ProgressEstimate {
            percent,
            step: step_label(percent),
        }
    }
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new(&ProgressConfig::default())
    }
}

/// Label for a progress percentage
pub fn step_label(percent: u8) -> &'static str {
    STEP_LABELS
        .iter()
        .find(|(threshold, _)| percent < *threshold)
        .map(|(_, label)| *label)
        .unwrap_or(FINAL_STEP_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let estimate = ProgressEstimator::default().estimate(0.0);
        assert_eq!(estimate.percent, 0);
        assert_eq!(estimate.step, "Initializing");
    }

    #[test]
    fn half_way_at_tau_ln2() {
        let estimate = ProgressEstimator::default().estimate(180.0 * std::f64::consts::LN_2);
        assert_eq!(estimate.percent, 50);
        assert_eq!(estimate.step, "Analyzing content");
    }

    #[test]
    fn never_exceeds_ceiling() {
        let estimator = ProgressEstimator::default();
        for t in [600.0, 3600.0, 86_400.0, f64::INFINITY] {
            assert_eq!(estimator.estimate(t).percent, 95);
        }
        assert_eq!(estimator.estimate(3600.0).step, "Finalizing extraction");
    }

    #[test]
    fn monotonic_over_time() {
        let estimator = ProgressEstimator::default();
        let mut previous = 0;
        for step in 0..2000 {
            let percent = estimator.estimate(step as f64 * 0.75).percent;
            assert!(percent >= previous, "dropped at step {step}");
            previous = percent;
        }
    }

    #[test]
    fn negative_and_nan_read_as_zero() {
        let estimator = ProgressEstimator::default();
        assert_eq!(estimator.estimate(-30.0).percent, 0);
        assert_eq!(estimator.estimate(f64::NAN).percent, 0);
    }

    #[test]
    fn label_thresholds() {
        assert_eq!(step_label(9), "Initializing");
        assert_eq!(step_label(10), "Scanning document");
        assert_eq!(step_label(29), "Scanning document");
        assert_eq!(step_label(30), "Analyzing content");
        assert_eq!(step_label(60), "Extracting data");
        assert_eq!(step_label(80), "Finalizing extraction");
    }

    #[test]
    fn custom_curve() {
        let estimator = ProgressEstimator::new(&ProgressConfig {
            tau_seconds: 10.0,
            max_percent: 90,
        });
        assert_eq!(estimator.estimate(1000.0).percent, 90);
    }
}
