//! Loyalty risk scoring for retail customers.
//!
//! # Overview
//!
//! The SDK revolves around a [`Client`] that scores customers with two trained models: a
//! subscription classifier and a purchase-frequency regressor. Their outputs are blended into a
//! [`LoyaltyMetrics`] value holding a loyalty index in `[0, 1]` and a loyalty risk in `[0, 100]`.
//!
//! Besides scoring single customers, the client can:
//! - simulate what-if scenarios with [`Client::simulate()`],
//! - score whole populations with [`Client::score_population()`],
//! - rank model inputs with [`Client::top_importances()`],
//! - summarize scored populations with [`Client::risk_summary()`] and
//!   [`Client::segment_risk()`].
//!
//! # Model artifacts
//!
//! Models are trained elsewhere and exported as JSON artifacts. The client reads them from a
//! models directory (see [`ClientConfig`]) when [`Client::load_models()`] is called.
//!
//! ```no_run
//! # use loyalty::{ClientConfig, ModelRole};
//! let client = ClientConfig::from_env().to_client();
//! client.load_models()?;
//! for entry in client.top_importances(ModelRole::Subscription, 5)? {
//!     println!("{}: {:.3}", entry.feature_name, entry.importance);
//! }
//! # Ok::<(), loyalty::Error>(())
//! ```
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. A record that is missing a required field is
//! never scored with a default value: the error names the field and the customer instead.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages under the `loyalty` target. Consider integrating a `log`-compatible logger
//! implementation for better visibility into model loading and batch scoring.
//!
//! # Examples
//!
//! A runnable example lives in the `examples/` directory of the `loyalty` crate.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;

#[doc(inline)]
pub use loyalty_core::{
    eval::{
        BatchReport, FeatureImportance, RecordFailure, RiskSummary, ScenarioResult,
        ScoredPopulation, ScoredRecord, SegmentSummary,
    },
    index::LoyaltyMetrics,
    model::ModelRole,
    CustomerRecord, Error, Feature, FeatureValue, FieldValues, FrequencyBand, Parallelism,
    Result, UnknownFieldPolicy,
};

pub use client::Client;
pub use config::ClientConfig;
