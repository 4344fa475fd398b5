use std::sync::Arc;

use chrono::Utc;

use crate::features::{Feature, FieldValues};
use crate::index::LoyaltyMetrics;
use crate::model::ModelRole;
use crate::model_store::{LoyaltyModels, ModelStore};
use crate::parallel::Parallelism;
use crate::record::UnknownFieldPolicy;
use crate::{CustomerRecord, Result};

use super::{
    importances_by_feature, score_population, score_population_partial, score_record,
    segment_risk, simulate, top_importances, BatchReport, FeatureImportance, ScenarioResult,
    ScoredPopulation, SegmentSummary,
};

/// Knobs shared by every operation of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub unknown_field_policy: UnknownFieldPolicy,
    pub parallelism: Parallelism,
}

impl EngineOptions {
    pub const DEFAULT_UNKNOWN_FIELD_POLICY: UnknownFieldPolicy = UnknownFieldPolicy::Ignore;

    pub fn new() -> EngineOptions {
        EngineOptions::default()
    }

    pub fn unknown_field_policy(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_field_policy = policy;
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> EngineOptions {
        EngineOptions {
            unknown_field_policy: EngineOptions::DEFAULT_UNKNOWN_FIELD_POLICY,
            parallelism: Parallelism::available(),
        }
    }
}

/// Engine simplifies calling into scoring functions: it takes a fresh snapshot of the models for
/// every call and passes configured options automatically.
pub struct Engine {
    model_store: Arc<ModelStore>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(model_store: Arc<ModelStore>, options: EngineOptions) -> Engine {
        Engine {
            model_store,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Snapshot of the current models. Unloaded adapters stand in for models that haven't been
    /// loaded yet.
    pub fn models(&self) -> Arc<LoyaltyModels> {
        self.model_store.get_models().unwrap_or_default()
    }

    pub fn score(&self, record: &CustomerRecord) -> Result<LoyaltyMetrics> {
        score_record(&self.models(), record)
    }

    pub fn simulate(
        &self,
        base_record: &CustomerRecord,
        field_changes: &FieldValues,
    ) -> Result<ScenarioResult> {
        simulate(
            &self.models(),
            base_record,
            field_changes,
            self.options.unknown_field_policy,
        )
    }

    pub fn score_population(&self, records: &[CustomerRecord]) -> Result<ScoredPopulation> {
        score_population(&self.models(), records, self.options.parallelism, Utc::now())
    }

    pub fn score_population_partial(&self, records: &[CustomerRecord]) -> Result<BatchReport> {
        score_population_partial(&self.models(), records, self.options.parallelism, Utc::now())
    }

    pub fn top_importances(&self, role: ModelRole, n: usize) -> Result<Vec<FeatureImportance>> {
        top_importances(self.models().adapter(role), n)
    }

    pub fn importances_by_feature(&self, role: ModelRole) -> Result<Vec<FeatureImportance>> {
        importances_by_feature(self.models().adapter(role))
    }

    pub fn segment_risk(
        &self,
        population: &ScoredPopulation,
        feature: Feature,
    ) -> Result<Vec<SegmentSummary>> {
        segment_risk(population, feature)
    }
}
