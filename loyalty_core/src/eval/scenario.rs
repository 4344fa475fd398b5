use serde::{Deserialize, Serialize};

use crate::features::FieldValues;
use crate::index::LoyaltyMetrics;
use crate::model_store::LoyaltyModels;
use crate::record::UnknownFieldPolicy;
use crate::{CustomerRecord, Result};

use super::score_record;

/// Metrics of a record before and after a hypothetical change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub before: LoyaltyMetrics,
    pub after: LoyaltyMetrics,
    /// `after - before`, field by field.
    pub delta: LoyaltyMetrics,
}

/// Score `base_record`, apply `field_changes` to a copy of it, score the copy and diff the two.
///
/// `base_record` is never modified. Keys of `field_changes` that are not part of the feature
/// contract are handled according to `policy`.
pub fn simulate(
    models: &LoyaltyModels,
    base_record: &CustomerRecord,
    field_changes: &FieldValues,
    policy: UnknownFieldPolicy,
) -> Result<ScenarioResult> {
    let before = score_record(models, base_record)?;
    let modified = base_record.with_changes(field_changes, policy)?;
    let after = score_record(models, &modified)?;

    log::trace!(target: "loyalty",
                customer_id = base_record.customer_id,
                changes = field_changes.len(),
                risk_delta = after.loyalty_risk - before.loyalty_risk;
                "simulated scenario");

    Ok(ScenarioResult {
        before,
        after,
        delta: after - before,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::tests::{loaded_models, sigmoid};
    use crate::record::tests::sample_customers;
    use crate::{Error, FeatureValue};

    #[test]
    fn empty_changes_give_zero_delta() {
        let models = loaded_models();
        for customer in sample_customers() {
            let result = simulate(
                &models,
                &customer,
                &FieldValues::new(),
                UnknownFieldPolicy::Ignore,
            )
            .unwrap();

            assert_eq!(result.before, result.after);
            assert_eq!(result.delta.p_subscribe, 0.0);
            assert_eq!(result.delta.predicted_frequency_score, 0.0);
            assert_eq!(result.delta.loyalty_index, 0.0);
            assert_eq!(result.delta.loyalty_risk, 0.0);
        }
    }

    #[test]
    fn removing_discount_raises_risk() {
        let models = loaded_models();
        let customer = sample_customers()[0].clone();
        let changes: FieldValues = [("Discount Applied".to_owned(), "No".into())].into();

        let result = simulate(&models, &customer, &changes, UnknownFieldPolicy::Ignore).unwrap();

        assert!((result.after.p_subscribe - sigmoid(-0.05)).abs() < 1e-12);
        assert_eq!(result.after.predicted_frequency_score, 2.5);
        assert!(result.delta.loyalty_risk > 0.0);

        assert_eq!(result.delta.p_subscribe, result.after.p_subscribe - result.before.p_subscribe);
        assert_eq!(
            result.delta.predicted_frequency_score,
            result.after.predicted_frequency_score - result.before.predicted_frequency_score
        );
        assert_eq!(
            result.delta.loyalty_index,
            result.after.loyalty_index - result.before.loyalty_index
        );
        assert_eq!(
            result.delta.loyalty_risk,
            result.after.loyalty_risk - result.before.loyalty_risk
        );

        // The base record is left alone.
        assert_eq!(customer, sample_customers()[0]);
    }

    #[test]
    fn simulation_is_deterministic() {
        let models = loaded_models();
        let customer = &sample_customers()[2];
        let changes: FieldValues = [
            ("previous_purchases".to_owned(), 10.0.into()),
            ("promo_code_used".to_owned(), true.into()),
        ]
        .into();

        let first = simulate(&models, customer, &changes, UnknownFieldPolicy::Ignore).unwrap();
        let second = simulate(&models, customer, &changes, UnknownFieldPolicy::Ignore).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn unknown_fields_follow_policy() {
        let models = loaded_models();
        let customer = &sample_customers()[0];
        let changes: FieldValues = [("loyalty_tier".to_owned(), "Gold".into())].into();

        let ignored = simulate(&models, customer, &changes, UnknownFieldPolicy::Ignore).unwrap();
        assert_eq!(ignored.delta.loyalty_risk, 0.0);

        assert!(matches!(
            simulate(&models, customer, &changes, UnknownFieldPolicy::Reject),
            Err(Error::UnknownField { ref customer_id, ref field })
                if field == "loyalty_tier" && customer_id == &customer.customer_id
        ));
    }

    #[test]
    fn invalid_changes_are_errors() {
        let models = loaded_models();
        let customer = &sample_customers()[0];

        let changes: FieldValues = [("age".to_owned(), "old".into())].into();
        assert!(matches!(
            simulate(&models, customer, &changes, UnknownFieldPolicy::Ignore),
            Err(Error::InvalidInput { .. })
        ));

        let changes: FieldValues = [("season".to_owned(), FeatureValue::Null)].into();
        assert!(matches!(
            simulate(&models, customer, &changes, UnknownFieldPolicy::Ignore),
            Err(Error::MissingFeature { field: "season", .. })
        ));
    }
}
