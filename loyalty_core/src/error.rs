use std::sync::Arc;

use crate::model::ModelRole;
use crate::Str;

/// Represents a result type for operations in the loyalty engine.
///
/// This `Result` type is a standard Rust `Result` type where the error variant is defined by the
/// engine-specific [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur in the loyalty engine.
///
/// Errors are raised at the point of detection and surfaced unmodified. The engine never
/// substitutes default values for missing fields.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A required field is absent or unparseable.
    #[error("missing feature `{field}` for customer {customer_id}")]
    MissingFeature {
        /// Identifier of the offending record.
        customer_id: Str,
        /// Name of the missing field.
        field: &'static str,
    },

    /// Scoring was attempted before the model artifact was loaded.
    #[error("{role} model is not loaded")]
    ModelNotLoaded {
        /// Which model is missing.
        role: ModelRole,
    },

    /// A field is present but has the wrong type or an unusable value.
    #[error("invalid value for `{field}` for customer {customer_id}: {reason}")]
    InvalidInput {
        /// Identifier of the offending record.
        customer_id: Str,
        /// Name of the offending field.
        field: String,
        /// Human readable explanation.
        reason: String,
    },

    /// A scenario tried to change a field that is not part of the feature contract and unknown
    /// fields are configured to be rejected.
    #[error("unknown field `{field}` for customer {customer_id}")]
    UnknownField {
        /// Identifier of the record the scenario was applied to.
        customer_id: Str,
        /// Key of the rejected change.
        field: String,
    },

    /// Population segments were requested for a numeric feature.
    #[error("cannot segment by numeric feature `{0}`")]
    NotCategorical(&'static str),

    /// Model artifact is internally inconsistent or does not match the feature contract.
    #[error("invalid {role} model artifact: {reason}")]
    InvalidModel {
        /// Role the artifact was loaded for.
        role: ModelRole,
        /// Human readable explanation.
        reason: String,
    },

    /// Model artifact was written by an incompatible version of the training pipeline.
    #[error("unsupported model artifact format version {0}")]
    UnsupportedFormatVersion(semver::Version),

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Model artifact is not valid JSON or does not follow the artifact schema.
    #[error("error parsing model artifact")]
    Parse(#[source] Arc<serde_json::Error>),
}

impl Error {
    pub(crate) fn invalid_input(
        customer_id: &Str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Error {
        Error::InvalidInput {
            customer_id: customer_id.clone(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_model(role: ModelRole, reason: impl Into<String>) -> Error {
        Error::InvalidModel {
            role,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(Arc::new(value))
    }
}
