//! Population-level views of a scored population.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureKind};
use crate::{Error, Result, Str};

use super::ScoredPopulation;

/// Distribution of loyalty risk over a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation. `None` for a single customer.
    pub std: Option<f64>,
    pub min: f64,
    /// 25th percentile.
    pub q1: f64,
    pub median: f64,
    /// 75th percentile.
    pub q3: f64,
    pub max: f64,
}

/// Aggregated metrics of customers sharing one level of a categorical feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment: Str,
    pub customers: usize,
    pub mean_loyalty_risk: f64,
    pub mean_p_subscribe: f64,
    pub mean_predicted_frequency_score: f64,
}

/// Summary statistics of loyalty risk. Returns `None` for an empty population.
///
/// Percentiles interpolate linearly between the two nearest order statistics.
pub fn risk_summary(population: &ScoredPopulation) -> Option<RiskSummary> {
    let mut risks = population
        .iter()
        .map(|scored| scored.metrics.loyalty_risk)
        .collect::<Vec<_>>();
    if risks.is_empty() {
        return None;
    }
    risks.sort_by(f64::total_cmp);

    let count = risks.len();
    let mean = risks.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let squares = risks.iter().map(|r| (r - mean).powi(2)).sum::<f64>();
        (squares / (count - 1) as f64).sqrt()
    });

    Some(RiskSummary {
        count,
        mean,
        std,
        min: risks[0],
        q1: percentile(&risks, 0.25),
        median: percentile(&risks, 0.5),
        q3: percentile(&risks, 0.75),
        max: risks[count - 1],
    })
}

/// Group customers by the level of a categorical `feature` and average their metrics.
///
/// Segments are ordered by ascending mean loyalty risk, so the most loyal segment comes first.
/// Segments with equal risk are ordered by name.
///
/// # Errors
///
/// [`Error::NotCategorical`] if `feature` is numeric.
pub fn segment_risk(population: &ScoredPopulation, feature: Feature) -> Result<Vec<SegmentSummary>> {
    if feature.kind() != FeatureKind::Categorical {
        return Err(Error::NotCategorical(feature.key()));
    }

    #[derive(Default)]
    struct Totals {
        customers: usize,
        loyalty_risk: f64,
        p_subscribe: f64,
        predicted_frequency_score: f64,
    }

    let mut groups = BTreeMap::<Str, Totals>::new();
    for scored in population {
        let Some(level) = scored.record.categorical(feature) else {
            continue;
        };
        let totals = groups.entry(level.clone()).or_default();
        totals.customers += 1;
        totals.loyalty_risk += scored.metrics.loyalty_risk;
        totals.p_subscribe += scored.metrics.p_subscribe;
        totals.predicted_frequency_score += scored.metrics.predicted_frequency_score;
    }

    let mut segments = groups
        .into_iter()
        .map(|(segment, totals)| {
            let n = totals.customers as f64;
            SegmentSummary {
                segment,
                customers: totals.customers,
                mean_loyalty_risk: totals.loyalty_risk / n,
                mean_p_subscribe: totals.p_subscribe / n,
                mean_predicted_frequency_score: totals.predicted_frequency_score / n,
            }
        })
        .collect::<Vec<_>>();
    // Stable: segments with equal risk keep the name order of the BTreeMap.
    segments.sort_by(|a, b| a.mean_loyalty_risk.total_cmp(&b.mean_loyalty_risk));

    Ok(segments)
}

/// `q`-th quantile of sorted, non-empty `values`.
fn percentile(values: &[f64], q: f64) -> f64 {
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    values[lower] + (values[upper] - values[lower]) * (position - lower as f64)
}
