//! Loyalty index calculator.
//!
//! Blends the subscription probability with the purchase-frequency estimate into a single loyalty
//! index in `[0, 1]` and the corresponding loyalty risk in `[0, 100]`.
use serde::{Deserialize, Serialize};

use crate::record::FrequencyBand;

/// Weight of the subscription probability in the loyalty index.
pub const SUBSCRIPTION_WEIGHT: f64 = 0.6;
/// Weight of the normalized purchase frequency in the loyalty index.
pub const FREQUENCY_WEIGHT: f64 = 0.4;
/// Lowest purchase-frequency score (`Annually`).
pub const MIN_FREQUENCY_SCORE: f64 = 1.0;
/// Highest purchase-frequency score (`Weekly`).
pub const MAX_FREQUENCY_SCORE: f64 = 7.0;

/// Composite metrics of one customer.
///
/// Also used to represent the difference between two sets of metrics (see
/// [`ScenarioResult`](crate::eval::ScenarioResult)), in which case fields may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyMetrics {
    /// Probability that the customer subscribes.
    pub p_subscribe: f64,
    /// Purchase-frequency estimate clamped to the 1–7 scale.
    pub predicted_frequency_score: f64,
    /// Higher is more loyal.
    pub loyalty_index: f64,
    /// `(1 - loyalty_index) * 100`. Higher is more likely to churn.
    pub loyalty_risk: f64,
}

impl LoyaltyMetrics {
    /// Combine raw model outputs into loyalty metrics.
    ///
    /// `freq_raw` may be any value the regressor emits; it is clamped to the 1–7 scale before
    /// normalization.
    pub fn compute(p_subscribe: f64, freq_raw: f64) -> LoyaltyMetrics {
        let predicted_frequency_score = freq_raw.clamp(MIN_FREQUENCY_SCORE, MAX_FREQUENCY_SCORE);
        let frequency_component = predicted_frequency_score / MAX_FREQUENCY_SCORE;

        let loyalty_index = (SUBSCRIPTION_WEIGHT * p_subscribe
            + FREQUENCY_WEIGHT * frequency_component)
            .clamp(0.0, 1.0);
        let loyalty_risk = (1.0 - loyalty_index) * 100.0;

        LoyaltyMetrics {
            p_subscribe,
            predicted_frequency_score,
            loyalty_index,
            loyalty_risk,
        }
    }

    /// Frequency band closest to the predicted frequency score.
    pub fn frequency_band(&self) -> FrequencyBand {
        FrequencyBand::nearest(self.predicted_frequency_score)
    }
}

/// Free-function form of [`LoyaltyMetrics::compute`].
pub fn compute(p_subscribe: f64, freq_raw: f64) -> LoyaltyMetrics {
    LoyaltyMetrics::compute(p_subscribe, freq_raw)
}

impl std::ops::Sub for LoyaltyMetrics {
    type Output = LoyaltyMetrics;

    /// Field-wise difference.
    fn sub(self, rhs: LoyaltyMetrics) -> LoyaltyMetrics {
        LoyaltyMetrics {
            p_subscribe: self.p_subscribe - rhs.p_subscribe,
            predicted_frequency_score: self.predicted_frequency_score
                - rhs.predicted_frequency_score,
            loyalty_index: self.loyalty_index - rhs.loyalty_index,
            loyalty_risk: self.loyalty_risk - rhs.loyalty_risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-4;

    #[test]
    fn worked_examples() {
        let metrics = compute(0.8, 5.0);
        assert_eq!(metrics.p_subscribe, 0.8);
        assert_eq!(metrics.predicted_frequency_score, 5.0);
        assert!((metrics.loyalty_index - 0.7657).abs() < EPSILON);
        assert!((metrics.loyalty_risk - 23.43).abs() < 1e-2);

        let metrics = compute(0.0, 0.0);
        assert_eq!(metrics.predicted_frequency_score, 1.0);
        assert!((metrics.loyalty_index - 0.0571).abs() < EPSILON);
        assert!((metrics.loyalty_risk - 94.29).abs() < 1e-2);
    }

    #[test]
    fn frequency_is_clamped() {
        assert_eq!(compute(0.5, -5.0).predicted_frequency_score, 1.0);
        assert_eq!(compute(0.5, 99.0).predicted_frequency_score, 7.0);
        assert_eq!(compute(0.5, 3.25).predicted_frequency_score, 3.25);
        assert_eq!(compute(0.5, 99.0).frequency_band(), FrequencyBand::Weekly);
    }

    #[test]
    fn index_and_risk_stay_in_range() {
        for p in [0.0, 0.1, 0.33, 0.5, 0.9, 1.0] {
            for f in [-100.0, 0.0, 1.0, 2.5, 4.0, 7.0, 7.5, 1e9] {
                let metrics = compute(p, f);
                assert!((0.0..=1.0).contains(&metrics.loyalty_index));
                assert!((0.0..=100.0).contains(&metrics.loyalty_risk));
                assert_eq!(metrics.loyalty_risk, (1.0 - metrics.loyalty_index) * 100.0);
            }
        }
    }

    #[test]
    fn index_is_monotonic() {
        let grid = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];
        for f in [0.0, 2.0, 5.5, 8.0] {
            for pair in grid.windows(2) {
                assert!(compute(pair[0], f).loyalty_index <= compute(pair[1], f).loyalty_index);
            }
        }
        for p in grid {
            for pair in [1.0, 2.0, 3.5, 6.0, 7.0].windows(2) {
                assert!(compute(p, pair[0]).loyalty_index <= compute(p, pair[1]).loyalty_index);
            }
        }
    }

    #[test]
    fn difference_is_field_wise() {
        let after = compute(0.8, 5.0);
        let before = compute(0.2, 3.0);
        let delta = after - before;

        assert_eq!(delta.p_subscribe, after.p_subscribe - before.p_subscribe);
        assert_eq!(delta.loyalty_risk, after.loyalty_risk - before.loyalty_risk);

        let zero = compute(0.3, 2.0) - compute(0.3, 2.0);
        assert_eq!(zero.loyalty_index, 0.0);
        assert_eq!(zero.predicted_frequency_score, 0.0);
    }
}
