use std::ffi::OsString;
use std::path::PathBuf;

use loyalty_core::{Parallelism, UnknownFieldPolicy};

use crate::Client;

/// Configuration for [`Client`].
///
/// # Examples
/// ```
/// # use loyalty::{ClientConfig, Parallelism, UnknownFieldPolicy};
/// let client = ClientConfig::from_models_dir("/var/lib/loyalty/models")
///     .unknown_field_policy(UnknownFieldPolicy::Reject)
///     .parallelism(Parallelism::threads(4))
///     .to_client();
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) models_dir: PathBuf,
    pub(crate) subscription_model_file: String,
    pub(crate) frequency_model_file: String,
    pub(crate) unknown_field_policy: UnknownFieldPolicy,
    pub(crate) parallelism: Parallelism,
}

impl ClientConfig {
    /// Default directory model artifacts are read from, relative to the working directory.
    pub const DEFAULT_MODELS_DIR: &'static str = "models";

    /// Environment variable overriding the models directory in [`ClientConfig::from_env`].
    pub const MODELS_DIR_ENV_VAR: &'static str = "LOYALTY_MODELS_DIR";

    /// Default file name of the subscription classifier artifact.
    pub const DEFAULT_SUBSCRIPTION_MODEL_FILE: &'static str = "subscription_model.json";

    /// Default file name of the purchase-frequency regressor artifact.
    pub const DEFAULT_FREQUENCY_MODEL_FILE: &'static str = "frequency_model.json";

    /// Create a default configuration reading model artifacts from `models_dir`.
    ///
    /// ```
    /// # use loyalty::ClientConfig;
    /// ClientConfig::from_models_dir("models");
    /// ```
    pub fn from_models_dir(models_dir: impl Into<PathBuf>) -> Self {
        ClientConfig {
            models_dir: models_dir.into(),
            subscription_model_file: ClientConfig::DEFAULT_SUBSCRIPTION_MODEL_FILE.to_owned(),
            frequency_model_file: ClientConfig::DEFAULT_FREQUENCY_MODEL_FILE.to_owned(),
            unknown_field_policy: UnknownFieldPolicy::default(),
            parallelism: Parallelism::default(),
        }
    }

    /// Create a default configuration, taking the models directory from the
    /// `LOYALTY_MODELS_DIR` environment variable if it is set and non-empty.
    pub fn from_env() -> Self {
        ClientConfig::from_env_value(std::env::var_os(ClientConfig::MODELS_DIR_ENV_VAR))
    }

    fn from_env_value(models_dir: Option<OsString>) -> Self {
        match models_dir {
            Some(dir) if !dir.is_empty() => ClientConfig::from_models_dir(dir),
            _ => ClientConfig::default(),
        }
    }

    /// Override the file name of the subscription classifier artifact.
    pub fn subscription_model_file(mut self, file_name: impl Into<String>) -> Self {
        self.subscription_model_file = file_name.into();
        self
    }

    /// Override the file name of the purchase-frequency regressor artifact.
    pub fn frequency_model_file(mut self, file_name: impl Into<String>) -> Self {
        self.frequency_model_file = file_name.into();
        self
    }

    /// Choose what scenarios do with changes to fields outside the feature contract. Unknown
    /// fields are ignored by default.
    pub fn unknown_field_policy(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_field_policy = policy;
        self
    }

    /// Limit the number of threads used for batch scoring. Defaults to the number of available
    /// cores.
    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Full path of the subscription classifier artifact.
    pub fn subscription_model_path(&self) -> PathBuf {
        self.models_dir.join(&self.subscription_model_file)
    }

    /// Full path of the purchase-frequency regressor artifact.
    pub fn frequency_model_path(&self) -> PathBuf {
        self.models_dir.join(&self.frequency_model_file)
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// ```
    /// # use loyalty::{ClientConfig, Client};
    /// let client: Client = ClientConfig::from_models_dir("models").to_client();
    /// ```
    pub fn to_client(self) -> Client {
        Client::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::from_models_dir(ClientConfig::DEFAULT_MODELS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();

        assert_eq!(
            config.subscription_model_path(),
            Path::new("models/subscription_model.json")
        );
        assert_eq!(
            config.frequency_model_path(),
            Path::new("models/frequency_model.json")
        );
        assert_eq!(config.unknown_field_policy, UnknownFieldPolicy::Ignore);
    }

    #[test]
    fn env_value_overrides_models_dir() {
        let config = ClientConfig::from_env_value(Some("/srv/models".into()));
        assert_eq!(config.models_dir, Path::new("/srv/models"));

        let config = ClientConfig::from_env_value(Some("".into()));
        assert_eq!(config.models_dir, Path::new(ClientConfig::DEFAULT_MODELS_DIR));

        let config = ClientConfig::from_env_value(None);
        assert_eq!(config.models_dir, Path::new(ClientConfig::DEFAULT_MODELS_DIR));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::from_models_dir("artifacts")
            .subscription_model_file("sub.json")
            .frequency_model_file("freq.json")
            .parallelism(Parallelism::sequential());

        assert_eq!(
            config.subscription_model_path(),
            Path::new("artifacts/sub.json")
        );
        assert_eq!(config.frequency_model_path(), Path::new("artifacts/freq.json"));
        assert_eq!(config.parallelism, Parallelism::sequential());
    }
}
