use serde::{Deserialize, Serialize};

use crate::features::{Feature, CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use crate::model::ModelRole;
use crate::{CustomerRecord, Error, Result};

/// Fitted preprocessing step shared by a model's training and inference paths.
///
/// Numeric features are standardized, categorical features are one-hot encoded. The encoded
/// vector holds one dimension per numeric feature followed by one dimension per category level,
/// both in feature-contract order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEncoder {
    pub numeric: Vec<NumericEncoding>,
    pub categorical: Vec<CategoricalEncoding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericEncoding {
    pub feature: Feature,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalEncoding {
    pub feature: Feature,
    /// Levels seen during training, in the order of their encoded dimensions.
    pub categories: Vec<String>,
}

impl FeatureEncoder {
    /// Number of dimensions produced by [`FeatureEncoder::encode`].
    pub fn output_len(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Names of encoded dimensions in emission order: `num__<feature>` for numeric features and
    /// `cat__<feature>_<level>` for every category level.
    pub fn output_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.output_len());
        names.extend(
            self.numeric
                .iter()
                .map(|n| format!("num__{}", n.feature.key())),
        );
        for encoding in &self.categorical {
            names.extend(
                encoding
                    .categories
                    .iter()
                    .map(|level| format!("cat__{}_{}", encoding.feature.key(), level)),
            );
        }
        names
    }

    /// Contract feature each encoded dimension was derived from, in emission order.
    pub fn output_sources(&self) -> Vec<Feature> {
        let mut sources = Vec::with_capacity(self.output_len());
        sources.extend(self.numeric.iter().map(|n| n.feature));
        for encoding in &self.categorical {
            sources.extend(std::iter::repeat(encoding.feature).take(encoding.categories.len()));
        }
        sources
    }

    /// Encode a record. The record must already satisfy the feature contract.
    ///
    /// Category levels not seen during training contribute zero to every dimension of their
    /// feature.
    pub fn encode(&self, record: &CustomerRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.output_len());

        for encoding in &self.numeric {
            let value = record.numeric(encoding.feature).unwrap_or(f64::NAN);
            row.push((value - encoding.mean) / encoding.scale);
        }

        for encoding in &self.categorical {
            let offset = row.len();
            row.resize(offset + encoding.categories.len(), 0.0);

            let level = record.categorical(encoding.feature).map(|level| &**level);
            match level.and_then(|level| encoding.categories.iter().position(|c| c == level)) {
                Some(index) => row[offset + index] = 1.0,
                None => {
                    log::trace!(target: "loyalty",
                                customer_id = record.customer_id,
                                feature = encoding.feature.key(),
                                level = level.unwrap_or_default();
                                "unknown category level, encoding as zeros");
                }
            }
        }

        row
    }

    /// Check that the encoder consumes exactly the feature contract, in contract order.
    pub(crate) fn validate(&self, role: ModelRole) -> Result<()> {
        let numeric = self.numeric.iter().map(|n| n.feature).collect::<Vec<_>>();
        if numeric != NUMERIC_FEATURES {
            return Err(Error::invalid_model(
                role,
                format!("numeric features {numeric:?} do not match the feature contract"),
            ));
        }

        let categorical = self.categorical.iter().map(|c| c.feature).collect::<Vec<_>>();
        if categorical != CATEGORICAL_FEATURES {
            return Err(Error::invalid_model(
                role,
                format!("categorical features {categorical:?} do not match the feature contract"),
            ));
        }

        if let Some(bad) = self
            .numeric
            .iter()
            .find(|n| !n.mean.is_finite() || !n.scale.is_finite() || n.scale == 0.0)
        {
            return Err(Error::invalid_model(
                role,
                format!("invalid scaling for `{}`", bad.feature),
            ));
        }

        for encoding in &self.categorical {
            if encoding.categories.is_empty() {
                return Err(Error::invalid_model(
                    role,
                    format!("no categories for `{}`", encoding.feature),
                ));
            }
            let mut levels = encoding.categories.iter().collect::<Vec<_>>();
            levels.sort();
            levels.dedup();
            if levels.len() != encoding.categories.len() {
                return Err(Error::invalid_model(
                    role,
                    format!("duplicate categories for `{}`", encoding.feature),
                ));
            }
        }

        Ok(())
    }
}
