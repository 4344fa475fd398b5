//! Trained model artifacts.
//!
//! A [`TrainedModel`] pairs a fitted [`FeatureEncoder`] with an [`Estimator`]. Artifacts are
//! produced by the training pipeline as JSON. They are validated when loaded and never mutated
//! afterwards.
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{CustomerRecord, Error, Result};

mod encoder;
mod estimator;

pub use encoder::{CategoricalEncoding, FeatureEncoder, NumericEncoding};
pub use estimator::{Estimator, Node, Tree};

/// Which predictive task a model serves.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Classifier returning the probability that a customer subscribes.
    #[display("subscription")]
    Subscription,
    /// Regressor estimating the 1–7 purchase-frequency score.
    #[display("frequency")]
    Frequency,
}

/// Immutable trained model: metadata, fitted encoder and fitted estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainedModel {
    /// Version of the artifact layout. Only `1.x` artifacts are understood.
    pub format_version: semver::Version,
    pub role: ModelRole,
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub encoder: FeatureEncoder,
    pub estimator: Estimator,
}

impl TrainedModel {
    /// Major artifact format version this engine understands.
    pub const SUPPORTED_FORMAT_MAJOR: u64 = 1;

    /// Parse and validate an artifact from a reader.
    pub fn from_reader(reader: impl Read) -> Result<TrainedModel> {
        let model: TrainedModel = serde_json::from_reader(reader)?;
        model.validate()?;
        log::debug!(target: "loyalty",
                    role:display = model.role,
                    name = model.name.as_str(),
                    dimensions = model.encoder.output_len();
                    "loaded model artifact");
        Ok(model)
    }

    /// Parse and validate an artifact from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<TrainedModel> {
        let file = std::fs::File::open(path.as_ref())?;
        TrainedModel::from_reader(std::io::BufReader::new(file))
    }

    /// Check that the artifact matches the feature contract and is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.format_version.major != TrainedModel::SUPPORTED_FORMAT_MAJOR {
            log::warn!(target: "loyalty",
                       role:display = self.role,
                       format_version:display = self.format_version;
                       "rejecting model artifact");
            return Err(Error::UnsupportedFormatVersion(self.format_version.clone()));
        }

        self.encoder.validate(self.role)?;
        self.estimator
            .validate(self.role, self.encoder.output_len())
    }

    /// Validate, encode and predict a single record.
    pub fn predict(&self, record: &CustomerRecord) -> Result<f64> {
        record.validate()?;
        Ok(self.predict_unchecked(record))
    }

    /// Predict a record that has already passed [`CustomerRecord::validate`].
    pub(crate) fn predict_unchecked(&self, record: &CustomerRecord) -> f64 {
        let row = self.encoder.encode(record);
        self.estimator.predict(&row, self.role)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs::File;

    use super::*;

    pub(crate) fn subscription_model() -> TrainedModel {
        TrainedModel::from_reader(
            File::open("../test-data/models/subscription_model.json").unwrap(),
        )
        .unwrap()
    }

    pub(crate) fn frequency_model() -> TrainedModel {
        TrainedModel::from_reader(File::open("../test-data/models/frequency_model.json").unwrap())
            .unwrap()
    }

    #[test]
    fn loads_test_artifacts() {
        let subscription = subscription_model();
        assert_eq!(subscription.role, ModelRole::Subscription);
        assert_eq!(subscription.encoder.output_len(), 38);

        let frequency = frequency_model();
        assert_eq!(frequency.role, ModelRole::Frequency);
        assert!(matches!(frequency.estimator, Estimator::Forest { .. }));
    }

    #[test]
    fn rejects_unsupported_format_version() {
        let mut model = subscription_model();
        model.format_version = semver::Version::new(2, 0, 0);
        assert!(matches!(
            model.validate(),
            Err(Error::UnsupportedFormatVersion(_))
        ));

        model.format_version = semver::Version::new(1, 3, 0);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn rejects_encoder_out_of_contract_order() {
        let mut model = subscription_model();
        model.encoder.numeric.swap(0, 1);
        assert!(matches!(
            model.validate(),
            Err(Error::InvalidModel {
                role: ModelRole::Subscription,
                ..
            })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            TrainedModel::from_reader(&b"{\"formatVersion\": \"1.0.0\"}"[..]),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn predict_checks_contract() {
        let model = subscription_model();
        let mut customer = crate::record::tests::sample_customers()[0].clone();
        customer.previous_purchases = f64::NAN;

        assert!(matches!(
            model.predict(&customer),
            Err(Error::MissingFeature {
                field: "previous_purchases",
                ..
            })
        ));
    }
}
