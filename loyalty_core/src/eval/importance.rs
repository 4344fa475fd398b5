use serde::{Deserialize, Serialize};

use crate::adapter::ModelAdapter;
use crate::features::FEATURE_CONTRACT;
use crate::Result;

/// Importance of one named input of a model.
///
/// Importances of one model need not sum to one but are comparable in rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature_name: String,
    pub importance: f64,
}

/// The `n` most important encoded dimensions of a model, most important first.
///
/// Ties keep encoder emission order. Asking for more entries than the model has returns all of
/// them.
pub fn top_importances(adapter: &dyn ModelAdapter, n: usize) -> Result<Vec<FeatureImportance>> {
    let mut importances = adapter.feature_importances()?;
    rank(&mut importances);
    importances.truncate(n);
    Ok(importances)
}

/// Importances summed back to the contract features they were encoded from (every one-hot level
/// of a categorical feature counts towards that feature), most important first.
///
/// Ties keep feature-contract order.
pub fn importances_by_feature(adapter: &dyn ModelAdapter) -> Result<Vec<FeatureImportance>> {
    let model = adapter.loaded()?;

    let mut totals = [0.0; FEATURE_CONTRACT.len()];
    for (source, weight) in model
        .encoder
        .output_sources()
        .into_iter()
        .zip(model.estimator.importances())
    {
        if let Some(position) = FEATURE_CONTRACT.iter().position(|f| *f == source) {
            totals[position] += weight;
        }
    }

    let mut importances = FEATURE_CONTRACT
        .iter()
        .zip(totals)
        .map(|(feature, importance)| FeatureImportance {
            feature_name: feature.key().to_owned(),
            importance,
        })
        .collect::<Vec<_>>();
    rank(&mut importances);
    Ok(importances)
}

fn rank(importances: &mut [FeatureImportance]) {
    // `sort_by` is stable, which is what keeps ties in their original order.
    importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ClassifierAdapter;
    use crate::eval::tests::loaded_models;
    use crate::Error;

    fn names(importances: &[FeatureImportance]) -> Vec<&str> {
        importances
            .iter()
            .map(|entry| entry.feature_name.as_str())
            .collect()
    }

    #[test]
    fn top_importances_are_sorted_and_truncated() {
        let models = loaded_models();

        let top = top_importances(&models.subscription, 4).unwrap();

        assert_eq!(
            names(&top),
            vec![
                "cat__discount_applied_Yes",
                "cat__promo_code_used_Yes",
                // Tied at 0.5, kept in encoder order.
                "num__previous_purchases",
                "cat__shipping_type_Express",
            ]
        );
        assert_eq!(top[0].importance, 2.0);
        assert_eq!(top[3].importance, 0.5);
    }

    #[test]
    fn top_importances_handles_edge_sizes() {
        let models = loaded_models();

        assert!(top_importances(&models.frequency, 0).unwrap().is_empty());

        let all = top_importances(&models.frequency, 1000).unwrap();
        assert_eq!(all.len(), 38);
        assert_eq!(all[0].feature_name, "num__previous_purchases");
        assert_eq!(all[1].feature_name, "cat__discount_applied_Yes");
        // The remaining zero weights stay in encoder order.
        assert_eq!(all[2].feature_name, "num__age");
        assert_eq!(all[3].feature_name, "num__purchase_amount");
    }

    #[test]
    fn importances_fold_back_to_contract_features() {
        let models = loaded_models();

        let by_feature = importances_by_feature(&models.subscription).unwrap();

        assert_eq!(by_feature.len(), FEATURE_CONTRACT.len());
        assert_eq!(
            names(&by_feature[..5]),
            vec![
                "discount_applied",
                "promo_code_used",
                "previous_purchases",
                "shipping_type",
                "age",
            ]
        );
        assert!(by_feature[4..].iter().all(|entry| entry.importance == 0.0));
    }

    #[test]
    fn unloaded_adapter_is_an_error() {
        let adapter = ClassifierAdapter::unloaded();
        assert!(matches!(
            top_importances(&adapter, 3),
            Err(Error::ModelNotLoaded { .. })
        ));
        assert!(matches!(
            importances_by_feature(&adapter),
            Err(Error::ModelNotLoaded { .. })
        ));
    }
}
