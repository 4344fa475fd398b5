//! `loyalty_core` is the scoring engine behind loyalty risk estimates. If you just want to score
//! customers, you probably want to take a look at the `loyalty` crate instead.
//!
//! # Overview
//!
//! A customer's *loyalty index* blends two independently trained models: a classifier predicting
//! the probability that the customer subscribes, and a regressor estimating how often they buy
//! (on a 1–7 scale). The *loyalty risk* is the complement of that index, scaled to 0–100.
//!
//! The [feature contract](features) is the fixed, ordered set of inputs both models consume.
//! [`CustomerRecord`] is a strongly typed record carrying exactly those inputs.
//!
//! [`TrainedModel`](model::TrainedModel) is an immutable model artifact: a fitted feature encoder
//! paired with a fitted estimator. Artifacts are validated against the feature contract once, when
//! they are loaded, and are shared read-only afterwards.
//!
//! [`ClassifierAdapter`](adapter::ClassifierAdapter) and
//! [`RegressorAdapter`](adapter::RegressorAdapter) wrap artifacts for their respective tasks and
//! expose single-record and batch predictions as well as feature importances.
//!
//! [`ModelStore`](model_store::ModelStore) is a thread-safe multi-reader multi-writer in-memory
//! slot for the currently active [`LoyaltyModels`](model_store::LoyaltyModels). Whenever models
//! change, they are replaced completely, so a reader holding a snapshot gets consistent results.
//!
//! The [`index`] module combines raw model outputs into [`LoyaltyMetrics`](index::LoyaltyMetrics).
//!
//! The [`eval`] module contains the scoring operations: single-record scoring, what-if scenario
//! simulation, batch scoring of whole populations, feature importance rankings and per-segment
//! aggregation. These are pure functions; [`Engine`](eval::Engine) is a helper that passes the
//! current model snapshot and configured options automatically.
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade with target `"loyalty"`. It never installs a logger.
//!
//! # Versioning
//!
//! This library follows semver. However, it is considered an internal library, so expect frequent
//! breaking changes and major version bumps.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod eval;
pub mod features;
pub mod index;
pub mod model;
pub mod model_store;
pub mod record;

mod error;
mod parallel;
mod str;

pub use crate::str::Str;
pub use error::{Error, Result};
pub use features::{Feature, FeatureValue, FieldValues};
pub use parallel::Parallelism;
pub use record::{CustomerRecord, FrequencyBand, UnknownFieldPolicy};
