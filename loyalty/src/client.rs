use std::path::Path;
use std::sync::Arc;

#[cfg(doc)]
use crate::Error;
use crate::{ClientConfig, CustomerRecord, FieldValues, Result};

use loyalty_core::adapter::ModelAdapter;
use loyalty_core::eval::{
    risk_summary, BatchReport, Engine, EngineOptions, FeatureImportance, RiskSummary,
    ScenarioResult, ScoredPopulation, SegmentSummary,
};
use loyalty_core::index::LoyaltyMetrics;
use loyalty_core::model::{ModelRole, TrainedModel};
use loyalty_core::model_store::{LoyaltyModels, ModelStore};
use loyalty_core::Feature;

/// A client scoring customers with a pair of trained models.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// # Loading models
///
/// A new client holds no models. Call [`Client::load_models()`] before scoring; until then every
/// scoring call fails with [`Error::ModelNotLoaded`].
///
/// # Examples
/// ```no_run
/// # use loyalty::{Client, ClientConfig};
/// let client = Client::new(ClientConfig::from_env());
/// client.load_models().expect("model artifacts should be readable");
/// ```
pub struct Client {
    model_store: Arc<ModelStore>,
    engine: Engine,
    config: ClientConfig,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    ///
    /// ```
    /// # use loyalty::{ClientConfig, Client};
    /// let client = Client::new(ClientConfig::default());
    /// ```
    pub fn new(config: ClientConfig) -> Self {
        let model_store = Arc::new(ModelStore::new());
        let engine = Engine::new(
            model_store.clone(),
            EngineOptions::new()
                .unknown_field_policy(config.unknown_field_policy)
                .parallelism(config.parallelism),
        );
        Client {
            model_store,
            engine,
            config,
        }
    }

    /// Read both model artifacts from the configured directory, validate them and make them
    /// active.
    ///
    /// Models are replaced only if both artifacts load successfully. Calling this again reloads
    /// the artifacts; scoring calls already in flight finish with the models they started with.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if an artifact cannot be read.
    /// - [`Error::Parse`] if an artifact is not a valid model artifact.
    /// - [`Error::UnsupportedFormatVersion`] or [`Error::InvalidModel`] if an artifact does not
    ///   match the feature contract or was trained for another role.
    pub fn load_models(&self) -> Result<()> {
        let subscription = load_artifact(
            ModelRole::Subscription,
            &self.config.subscription_model_path(),
        )?;
        let frequency = load_artifact(ModelRole::Frequency, &self.config.frequency_model_path())?;

        let models = LoyaltyModels::from_artifacts(subscription, frequency)?;
        self.model_store.set_models(Arc::new(models));

        log::info!(target: "loyalty",
                   models_dir:display = self.config.models_dir.display();
                   "loaded loyalty models");
        Ok(())
    }

    /// Whether both models are loaded.
    pub fn is_loaded(&self) -> bool {
        self.model_store.get_models().map_or(false, |models| {
            models.subscription.model().is_some() && models.frequency.model().is_some()
        })
    }

    /// Compute loyalty metrics of a single customer.
    ///
    /// # Errors
    ///
    /// - [`Error::ModelNotLoaded`] if models have not been loaded.
    /// - [`Error::MissingFeature`] or [`Error::InvalidInput`] if the record violates the feature
    ///   contract.
    pub fn score(&self, record: &CustomerRecord) -> Result<LoyaltyMetrics> {
        self.engine.score(record)
    }

    /// Compare metrics of `base_record` before and after applying `field_changes`.
    ///
    /// `field_changes` keys may be feature keys (`"shipping_type"`) or dataset column headers
    /// (`"Shipping Type"`). Keys outside the feature contract are handled according to
    /// [`ClientConfig::unknown_field_policy()`].
    ///
    /// # Examples
    ///
    /// ```
    /// # fn test(client: &loyalty::Client, customer: &loyalty::CustomerRecord) -> loyalty::Result<()> {
    /// let changes: loyalty::FieldValues = [("shipping_type".to_owned(), "Express".into())].into();
    /// let scenario = client.simulate(customer, &changes)?;
    /// println!("risk changes by {:+.2}", scenario.delta.loyalty_risk);
    /// # Ok(())
    /// # }
    /// ```
    pub fn simulate(
        &self,
        base_record: &CustomerRecord,
        field_changes: &FieldValues,
    ) -> Result<ScenarioResult> {
        self.engine.simulate(base_record, field_changes)
    }

    /// Score a population, failing on the first invalid record.
    pub fn score_population(&self, records: &[CustomerRecord]) -> Result<ScoredPopulation> {
        self.engine.score_population(records)
    }

    /// Score a population, reporting invalid records instead of failing.
    pub fn score_population_partial(&self, records: &[CustomerRecord]) -> Result<BatchReport> {
        self.engine.score_population_partial(records)
    }

    /// The `n` most important encoded inputs of a model.
    pub fn top_importances(&self, role: ModelRole, n: usize) -> Result<Vec<FeatureImportance>> {
        self.engine.top_importances(role, n)
    }

    /// Importances of a model summed per contract feature.
    pub fn importances_by_feature(&self, role: ModelRole) -> Result<Vec<FeatureImportance>> {
        self.engine.importances_by_feature(role)
    }

    /// Loyalty risk distribution of a scored population. Returns `None` for an empty population.
    pub fn risk_summary(&self, population: &ScoredPopulation) -> Option<RiskSummary> {
        risk_summary(population)
    }

    /// Mean metrics per level of a categorical feature, lowest risk first.
    pub fn segment_risk(
        &self,
        population: &ScoredPopulation,
        feature: Feature,
    ) -> Result<Vec<SegmentSummary>> {
        self.engine.segment_risk(population, feature)
    }
}

fn load_artifact(role: ModelRole, path: &Path) -> Result<TrainedModel> {
    TrainedModel::from_path(path).map_err(|err| {
        log::warn!(target: "loyalty",
                   role:display = role,
                   path:display = path.display();
                   "failed to load model artifact: {err}");
        err
    })
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use loyalty_core::model::ModelRole;
    use loyalty_core::Parallelism;

    use crate::{
        Client, ClientConfig, CustomerRecord, Error, Feature, FieldValues, UnknownFieldPolicy,
    };

    fn test_config() -> ClientConfig {
        ClientConfig::from_models_dir("../test-data/models").parallelism(Parallelism::threads(2))
    }

    fn customers() -> Vec<CustomerRecord> {
        serde_json::from_reader(File::open("../test-data/customers.json").unwrap()).unwrap()
    }

    #[test]
    fn fails_until_models_are_loaded() {
        let _ = env_logger::builder().is_test(true).try_init();

        let client = Client::new(test_config());
        assert!(!client.is_loaded());
        assert!(matches!(
            client.score(&customers()[0]),
            Err(Error::ModelNotLoaded { .. })
        ));

        client.load_models().unwrap();

        assert!(client.is_loaded());
        let metrics = client.score(&customers()[0]).unwrap();
        assert!((0.0..=100.0).contains(&metrics.loyalty_risk));
        assert_eq!(metrics.predicted_frequency_score, 5.5);
    }

    #[test]
    fn missing_artifacts_surface_io_errors() {
        let client = ClientConfig::from_models_dir("../test-data/no-such-dir").to_client();

        assert!(matches!(client.load_models(), Err(Error::Io(_))));
        assert!(!client.is_loaded());
        assert!(matches!(
            client.top_importances(ModelRole::Subscription, 3),
            Err(Error::ModelNotLoaded { .. })
        ));
    }

    #[test]
    fn swapped_artifacts_are_rejected() {
        let client = test_config()
            .subscription_model_file("frequency_model.json")
            .frequency_model_file("subscription_model.json")
            .to_client();

        assert!(matches!(
            client.load_models(),
            Err(Error::InvalidModel { .. })
        ));
        assert!(!client.is_loaded());
    }

    #[test]
    fn end_to_end() {
        let client = test_config()
            .unknown_field_policy(UnknownFieldPolicy::Reject)
            .to_client();
        client.load_models().unwrap();
        let customers = customers();

        let population = client.score_population(&customers).unwrap();
        assert_eq!(population.len(), customers.len());

        let summary = client.risk_summary(&population).unwrap();
        assert_eq!(summary.count, customers.len());
        assert!(summary.min <= summary.median && summary.median <= summary.max);

        let segments = client.segment_risk(&population, Feature::Gender).unwrap();
        assert_eq!(segments.len(), 2);

        let top = client.top_importances(ModelRole::Subscription, 1).unwrap();
        assert_eq!(top[0].feature_name, "cat__discount_applied_Yes");

        let changes: FieldValues = [("Favorite Color".to_owned(), "Teal".into())].into();
        assert!(matches!(
            client.simulate(&customers[0], &changes),
            Err(Error::UnknownField { .. })
        ));
    }
}
