//! Scoring operations.
//!
//! Everything here is a pure function over an immutable [`LoyaltyModels`] snapshot: no locks, no
//! I/O, no hidden state. [`Engine`] is a convenience wrapper that supplies the current snapshot
//! and the configured options.
mod batch;
mod engine;
mod importance;
mod scenario;
mod segments;

pub use batch::{
    score_population, score_population_partial, BatchReport, RecordFailure, ScoredPopulation,
    ScoredRecord,
};
pub use engine::{Engine, EngineOptions};
pub use importance::{importances_by_feature, top_importances, FeatureImportance};
pub use scenario::{simulate, ScenarioResult};
pub use segments::{risk_summary, segment_risk, RiskSummary, SegmentSummary};

use crate::index::LoyaltyMetrics;
use crate::model_store::LoyaltyModels;
use crate::{CustomerRecord, Result};

/// Score a single record with both models.
///
/// # Errors
///
/// - [`Error::ModelNotLoaded`](crate::Error::ModelNotLoaded) if either model is missing.
/// - [`Error::MissingFeature`](crate::Error::MissingFeature) or
///   [`Error::InvalidInput`](crate::Error::InvalidInput) if the record violates the feature
///   contract.
pub fn score_record(models: &LoyaltyModels, record: &CustomerRecord) -> Result<LoyaltyMetrics> {
    let p_subscribe = models.subscription.predict_probability(record)?;
    let freq_raw = models.frequency.predict_value(record)?;
    Ok(LoyaltyMetrics::compute(p_subscribe, freq_raw))
}
