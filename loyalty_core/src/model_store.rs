//! A thread-safe in-memory slot for the currently active pair of models. [`ModelStore`] provides
//! concurrent access for readers (scoring) and writers (model loading).
use std::sync::{Arc, RwLock};

use crate::adapter::{ClassifierAdapter, ModelAdapter, RegressorAdapter};
use crate::model::{ModelRole, TrainedModel};
use crate::Result;

/// The two models the loyalty index is built from.
///
/// Either adapter may be unloaded, in which case every operation that needs it fails with
/// [`Error::ModelNotLoaded`](crate::Error::ModelNotLoaded).
#[derive(Debug, Clone, Default)]
pub struct LoyaltyModels {
    pub subscription: ClassifierAdapter,
    pub frequency: RegressorAdapter,
}

impl LoyaltyModels {
    pub fn new(subscription: ClassifierAdapter, frequency: RegressorAdapter) -> LoyaltyModels {
        LoyaltyModels {
            subscription,
            frequency,
        }
    }

    /// Wrap a pair of loaded artifacts, checking that each one was trained for its role.
    pub fn from_artifacts(
        subscription: TrainedModel,
        frequency: TrainedModel,
    ) -> Result<LoyaltyModels> {
        Ok(LoyaltyModels {
            subscription: ClassifierAdapter::new(Arc::new(subscription))?,
            frequency: RegressorAdapter::new(Arc::new(frequency))?,
        })
    }

    /// Adapter serving `role`.
    pub fn adapter(&self, role: ModelRole) -> &dyn ModelAdapter {
        match role {
            ModelRole::Subscription => &self.subscription,
            ModelRole::Frequency => &self.frequency,
        }
    }
}

/// `ModelStore` provides a thread-safe (`Sync`) storage for loaded models that allows concurrent
/// access for readers and writers.
///
/// `LoyaltyModels` is never mutated in place and can only be replaced completely, so a reader that
/// got a snapshot keeps scoring against the same pair of models even if a writer publishes a new
/// one in the meantime.
#[derive(Default)]
pub struct ModelStore {
    models: RwLock<Option<Arc<LoyaltyModels>>>,
}

impl ModelStore {
    /// Create a new empty model store.
    pub fn new() -> Self {
        ModelStore::default()
    }

    /// Get currently-active models. Returns `None` if models haven't been loaded yet.
    pub fn get_models(&self) -> Option<Arc<LoyaltyModels>> {
        // A poisoned lock still holds a valid `Arc`: writers only ever swap it.
        let models = self
            .models
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        models.clone()
    }

    /// Replace the active models.
    pub fn set_models(&self, models: Arc<LoyaltyModels>) {
        let mut slot = self
            .models
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        *slot = Some(models);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{LoyaltyModels, ModelStore};
    use crate::adapter::ModelAdapter;
    use crate::model::tests::{frequency_model, subscription_model};
    use crate::model::ModelRole;

    #[test]
    fn can_set_models_from_another_thread() {
        let store = Arc::new(ModelStore::new());

        assert!(store.get_models().is_none());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                let models =
                    LoyaltyModels::from_artifacts(subscription_model(), frequency_model())
                        .unwrap();
                store.set_models(Arc::new(models));
            })
            .join();
        }

        let models = store.get_models().unwrap();
        assert!(models.subscription.loaded().is_ok());
        assert_eq!(models.adapter(ModelRole::Frequency).role(), ModelRole::Frequency);
    }

    #[test]
    fn snapshots_survive_replacement() {
        let store = ModelStore::new();
        store.set_models(Arc::new(
            LoyaltyModels::from_artifacts(subscription_model(), frequency_model()).unwrap(),
        ));

        let snapshot = store.get_models().unwrap();
        store.set_models(Arc::new(LoyaltyModels::default()));

        assert!(snapshot.frequency.loaded().is_ok());
        assert!(store.get_models().unwrap().frequency.loaded().is_err());
    }

    #[test]
    fn from_artifacts_checks_roles() {
        assert!(LoyaltyModels::from_artifacts(frequency_model(), subscription_model()).is_err());
    }
}
