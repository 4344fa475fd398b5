//! Model adapters: the boundary between the scoring engine and trained model artifacts.
//!
//! There is one adapter per predictive task. [`ClassifierAdapter`] answers "how likely is this
//! customer to subscribe", [`RegressorAdapter`] answers "how often does this customer buy". Both
//! hold their artifact behind an `Arc` and never mutate it.
use std::sync::Arc;

use crate::eval::FeatureImportance;
use crate::model::{ModelRole, TrainedModel};
use crate::parallel::{map_chunks, Parallelism};
use crate::{CustomerRecord, Error, Result};

/// Common behavior of the per-task adapters.
pub trait ModelAdapter {
    /// Task this adapter serves.
    fn role(&self) -> ModelRole;

    /// Loaded artifact, if any.
    fn model(&self) -> Option<&Arc<TrainedModel>>;

    /// Loaded artifact or [`Error::ModelNotLoaded`].
    fn loaded(&self) -> Result<&TrainedModel> {
        self.model()
            .map(|model| model.as_ref())
            .ok_or(Error::ModelNotLoaded { role: self.role() })
    }

    /// Importance weight of every encoded dimension, paired with the encoder's output name.
    ///
    /// Entries are in encoder emission order: estimator weights are positional, so this order is
    /// the only thing tying a weight to its name.
    fn feature_importances(&self) -> Result<Vec<FeatureImportance>> {
        let model = self.loaded()?;
        Ok(model
            .encoder
            .output_names()
            .into_iter()
            .zip(model.estimator.importances())
            .map(|(feature_name, importance)| FeatureImportance {
                feature_name,
                importance,
            })
            .collect())
    }
}

/// Adapter for the subscription classifier.
#[derive(Debug, Clone, Default)]
pub struct ClassifierAdapter {
    model: Option<Arc<TrainedModel>>,
}

/// Adapter for the purchase-frequency regressor.
#[derive(Debug, Clone, Default)]
pub struct RegressorAdapter {
    model: Option<Arc<TrainedModel>>,
}

impl ClassifierAdapter {
    /// Adapter without an artifact. Every prediction fails with [`Error::ModelNotLoaded`].
    pub fn unloaded() -> ClassifierAdapter {
        ClassifierAdapter::default()
    }

    /// Wrap a subscription artifact.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidModel`] if the artifact was trained for another task.
    pub fn new(model: Arc<TrainedModel>) -> Result<ClassifierAdapter> {
        check_role(&model, ModelRole::Subscription)?;
        Ok(ClassifierAdapter { model: Some(model) })
    }

    /// Probability that the customer subscribes, in `[0, 1]`.
    pub fn predict_probability(&self, record: &CustomerRecord) -> Result<f64> {
        self.loaded()?.predict(record)
    }

    /// [`ClassifierAdapter::predict_probability`] for every record, in input order.
    ///
    /// Fails on the first (lowest-index) record that violates the feature contract.
    pub fn predict_probability_batch(
        &self,
        records: &[CustomerRecord],
        parallelism: Parallelism,
    ) -> Result<Vec<f64>> {
        predict_batch(self.loaded()?, records, parallelism)
    }
}

impl RegressorAdapter {
    /// Adapter without an artifact. Every prediction fails with [`Error::ModelNotLoaded`].
    pub fn unloaded() -> RegressorAdapter {
        RegressorAdapter::default()
    }

    /// Wrap a frequency artifact.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidModel`] if the artifact was trained for another task.
    pub fn new(model: Arc<TrainedModel>) -> Result<RegressorAdapter> {
        check_role(&model, ModelRole::Frequency)?;
        Ok(RegressorAdapter { model: Some(model) })
    }

    /// Raw purchase-frequency estimate. The value is not clamped and may fall outside 1–7.
    pub fn predict_value(&self, record: &CustomerRecord) -> Result<f64> {
        self.loaded()?.predict(record)
    }

    /// [`RegressorAdapter::predict_value`] for every record, in input order.
    ///
    /// Fails on the first (lowest-index) record that violates the feature contract.
    pub fn predict_value_batch(
        &self,
        records: &[CustomerRecord],
        parallelism: Parallelism,
    ) -> Result<Vec<f64>> {
        predict_batch(self.loaded()?, records, parallelism)
    }
}

impl ModelAdapter for ClassifierAdapter {
    fn role(&self) -> ModelRole {
        ModelRole::Subscription
    }

    fn model(&self) -> Option<&Arc<TrainedModel>> {
        self.model.as_ref()
    }
}

impl ModelAdapter for RegressorAdapter {
    fn role(&self) -> ModelRole {
        ModelRole::Frequency
    }

    fn model(&self) -> Option<&Arc<TrainedModel>> {
        self.model.as_ref()
    }
}

fn check_role(model: &TrainedModel, expected: ModelRole) -> Result<()> {
    if model.role != expected {
        return Err(Error::invalid_model(
            expected,
            format!("artifact `{}` was trained for the {} role", model.name, model.role),
        ));
    }
    Ok(())
}

fn predict_batch(
    model: &TrainedModel,
    records: &[CustomerRecord],
    parallelism: Parallelism,
) -> Result<Vec<f64>> {
    // Each chunk stops at its first invalid record. Collecting chunk results in order then
    // surfaces the error of the lowest-index invalid record.
    let chunks = map_chunks(records, parallelism, |chunk| {
        chunk
            .iter()
            .map(|record| model.predict(record))
            .collect::<Result<Vec<f64>>>()
    });

    let mut predictions = Vec::with_capacity(records.len());
    for chunk in chunks {
        predictions.extend(chunk?);
    }
    Ok(predictions)
}
