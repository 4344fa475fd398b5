use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureKind, FeatureValue, FieldValues};
use crate::{Error, Result, Str};

/// A single customer with all feature-contract fields.
///
/// Field names deserialize from either snake-case keys or the dataset column headers (e.g.
/// `"Purchase Amount (USD)"`). Label fields are only consumed by training and evaluation
/// pipelines and never reach the models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Unique per record. Used for lookup and error reporting, never as a model input.
    #[serde(alias = "Customer ID")]
    pub customer_id: Str,

    #[serde(alias = "Age")]
    pub age: f64,
    #[serde(alias = "Purchase Amount (USD)")]
    pub purchase_amount: f64,
    #[serde(alias = "Previous Purchases")]
    pub previous_purchases: f64,
    #[serde(alias = "Review Rating")]
    pub review_rating: f64,

    #[serde(alias = "Gender")]
    pub gender: Str,
    #[serde(alias = "Item Purchased")]
    pub item_purchased: Str,
    #[serde(alias = "Category")]
    pub category: Str,
    #[serde(alias = "Location")]
    pub location: Str,
    #[serde(alias = "Size")]
    pub size: Str,
    #[serde(alias = "Color")]
    pub color: Str,
    #[serde(alias = "Season")]
    pub season: Str,
    #[serde(alias = "Shipping Type")]
    pub shipping_type: Str,
    #[serde(alias = "Discount Applied")]
    pub discount_applied: Str,
    #[serde(alias = "Promo Code Used")]
    pub promo_code_used: Str,
    #[serde(alias = "Payment Method")]
    pub payment_method: Str,

    /// Training label: `"Yes"` if the customer is subscribed.
    #[serde(default, alias = "Subscription Status")]
    pub subscription_status: Option<Str>,
    /// Training label for the frequency regressor.
    #[serde(default, alias = "Frequency of Purchases")]
    pub frequency_of_purchases: Option<FrequencyBand>,
}

/// What to do with scenario changes whose key is not part of the feature contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Skip unknown keys (logged at debug level). Lets callers pass whole rows as changes.
    #[default]
    Ignore,
    /// Fail with [`Error::UnknownField`].
    Reject,
}

impl CustomerRecord {
    /// Build a record from an untyped field map.
    ///
    /// Keys may be snake-case feature keys or dataset column headers. Keys outside the contract
    /// (other than the identifier and labels) are ignored.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingFeature`] if the identifier or any contract field is absent or null.
    /// - [`Error::InvalidInput`] if a field has the wrong type.
    pub fn from_attributes(values: &FieldValues) -> Result<CustomerRecord> {
        let lookup = |key: &str, column: &str| values.get(key).or_else(|| values.get(column));

        let customer_id: Str = match lookup("customer_id", "Customer ID") {
            Some(FeatureValue::String(s)) => Str::from(s.as_str()).trimmed(),
            Some(FeatureValue::Number(n)) => Str::from(n.to_string()),
            _ => {
                return Err(Error::MissingFeature {
                    customer_id: Str::from("<unknown>"),
                    field: "customer_id",
                })
            }
        };

        let numeric = |feature: Feature| -> Result<f64> {
            match lookup(feature.key(), feature.column_name()) {
                None | Some(FeatureValue::Null) => Err(Error::MissingFeature {
                    customer_id: customer_id.clone(),
                    field: feature.key(),
                }),
                Some(value) => numeric_value(&customer_id, feature, value),
            }
        };
        let categorical = |feature: Feature| -> Result<Str> {
            match lookup(feature.key(), feature.column_name()) {
                None | Some(FeatureValue::Null) => Err(Error::MissingFeature {
                    customer_id: customer_id.clone(),
                    field: feature.key(),
                }),
                Some(value) => categorical_value(&customer_id, feature, value),
            }
        };

        let subscription_status = match lookup("subscription_status", "Subscription Status") {
            Some(FeatureValue::String(s)) => Some(Str::from(s.as_str()).trimmed()),
            Some(FeatureValue::Boolean(b)) => Some(Str::from(yes_no(*b))),
            _ => None,
        };
        let frequency_of_purchases = match lookup("frequency_of_purchases", "Frequency of Purchases")
        {
            Some(FeatureValue::String(s)) => FrequencyBand::from_label(s.trim()),
            _ => None,
        };

        Ok(CustomerRecord {
            age: numeric(Feature::Age)?,
            purchase_amount: numeric(Feature::PurchaseAmount)?,
            previous_purchases: numeric(Feature::PreviousPurchases)?,
            review_rating: numeric(Feature::ReviewRating)?,
            gender: categorical(Feature::Gender)?,
            item_purchased: categorical(Feature::ItemPurchased)?,
            category: categorical(Feature::Category)?,
            location: categorical(Feature::Location)?,
            size: categorical(Feature::Size)?,
            color: categorical(Feature::Color)?,
            season: categorical(Feature::Season)?,
            shipping_type: categorical(Feature::ShippingType)?,
            discount_applied: categorical(Feature::DiscountApplied)?,
            promo_code_used: categorical(Feature::PromoCodeUsed)?,
            payment_method: categorical(Feature::PaymentMethod)?,
            subscription_status,
            frequency_of_purchases,
            customer_id,
        })
    }

    /// Value of a numeric feature. Returns `None` for categorical features.
    pub fn numeric(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Age => Some(self.age),
            Feature::PurchaseAmount => Some(self.purchase_amount),
            Feature::PreviousPurchases => Some(self.previous_purchases),
            Feature::ReviewRating => Some(self.review_rating),
            _ => None,
        }
    }

    /// Value of a categorical feature. Returns `None` for numeric features.
    pub fn categorical(&self, feature: Feature) -> Option<&Str> {
        match feature {
            Feature::Gender => Some(&self.gender),
            Feature::ItemPurchased => Some(&self.item_purchased),
            Feature::Category => Some(&self.category),
            Feature::Location => Some(&self.location),
            Feature::Size => Some(&self.size),
            Feature::Color => Some(&self.color),
            Feature::Season => Some(&self.season),
            Feature::ShippingType => Some(&self.shipping_type),
            Feature::DiscountApplied => Some(&self.discount_applied),
            Feature::PromoCodeUsed => Some(&self.promo_code_used),
            Feature::PaymentMethod => Some(&self.payment_method),
            _ => None,
        }
    }

    fn categorical_mut(&mut self, feature: Feature) -> Option<&mut Str> {
        match feature {
            Feature::Gender => Some(&mut self.gender),
            Feature::ItemPurchased => Some(&mut self.item_purchased),
            Feature::Category => Some(&mut self.category),
            Feature::Location => Some(&mut self.location),
            Feature::Size => Some(&mut self.size),
            Feature::Color => Some(&mut self.color),
            Feature::Season => Some(&mut self.season),
            Feature::ShippingType => Some(&mut self.shipping_type),
            Feature::DiscountApplied => Some(&mut self.discount_applied),
            Feature::PromoCodeUsed => Some(&mut self.promo_code_used),
            Feature::PaymentMethod => Some(&mut self.payment_method),
            _ => None,
        }
    }

    fn numeric_mut(&mut self, feature: Feature) -> Option<&mut f64> {
        match feature {
            Feature::Age => Some(&mut self.age),
            Feature::PurchaseAmount => Some(&mut self.purchase_amount),
            Feature::PreviousPurchases => Some(&mut self.previous_purchases),
            Feature::ReviewRating => Some(&mut self.review_rating),
            _ => None,
        }
    }

    /// Check that the record satisfies the feature contract.
    ///
    /// NaN numbers and blank categorical levels are treated as missing values. Unknown categorical
    /// levels are fine: the encoder maps them to all-zero dimensions.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingFeature`] for NaN numeric or blank categorical values.
    /// - [`Error::InvalidInput`] for infinite numeric values.
    pub fn validate(&self) -> Result<()> {
        for feature in crate::features::NUMERIC_FEATURES {
            let value = self.numeric(feature).unwrap_or(f64::NAN);
            if value.is_nan() {
                return Err(Error::MissingFeature {
                    customer_id: self.customer_id.clone(),
                    field: feature.key(),
                });
            }
            if value.is_infinite() {
                return Err(Error::invalid_input(
                    &self.customer_id,
                    feature.key(),
                    "value must be finite",
                ));
            }
        }
        for feature in crate::features::CATEGORICAL_FEATURES {
            if self.categorical(feature).map_or(true, |s| s.trim().is_empty()) {
                return Err(Error::MissingFeature {
                    customer_id: self.customer_id.clone(),
                    field: feature.key(),
                });
            }
        }
        Ok(())
    }

    /// Overwrite a single feature with `value`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingFeature`] if `value` is null.
    /// - [`Error::InvalidInput`] if `value` does not fit the feature type.
    pub fn set(&mut self, feature: Feature, value: &FeatureValue) -> Result<()> {
        if matches!(value, FeatureValue::Null) {
            return Err(Error::MissingFeature {
                customer_id: self.customer_id.clone(),
                field: feature.key(),
            });
        }

        match feature.kind() {
            FeatureKind::Numeric => {
                let parsed = numeric_value(&self.customer_id, feature, value)?;
                if let Some(slot) = self.numeric_mut(feature) {
                    *slot = parsed;
                }
            }
            FeatureKind::Categorical => {
                let parsed = categorical_value(&self.customer_id, feature, value)?;
                if let Some(slot) = self.categorical_mut(feature) {
                    *slot = parsed;
                }
            }
        }
        Ok(())
    }

    /// Return a copy of this record with `changes` applied. `self` is left untouched.
    ///
    /// Keys may be snake-case feature keys or dataset column headers. Keys outside the feature
    /// contract (including the identifier and label fields) are handled according to `policy`.
    pub fn with_changes(
        &self,
        changes: &FieldValues,
        policy: UnknownFieldPolicy,
    ) -> Result<CustomerRecord> {
        let mut modified = self.clone();

        // Sorted so that the first reported error does not depend on hash map iteration order.
        let mut keys = changes.keys().collect::<Vec<_>>();
        keys.sort();

        for key in keys {
            let value = &changes[key];
            match Feature::from_key(key) {
                Some(feature) => modified.set(feature, value)?,
                None => match policy {
                    UnknownFieldPolicy::Ignore => {
                        log::debug!(target: "loyalty",
                                    customer_id = self.customer_id,
                                    field = key.as_str();
                                    "ignoring change to field outside the feature contract");
                    }
                    UnknownFieldPolicy::Reject => {
                        return Err(Error::UnknownField {
                            customer_id: self.customer_id.clone(),
                            field: key.clone(),
                        })
                    }
                },
            }
        }

        Ok(modified)
    }
}

fn numeric_value(customer_id: &Str, feature: Feature, value: &FeatureValue) -> Result<f64> {
    match value {
        FeatureValue::Number(n) if n.is_finite() => Ok(*n),
        FeatureValue::Number(_) => Err(Error::invalid_input(
            customer_id,
            feature.key(),
            "value must be finite",
        )),
        FeatureValue::Null => Err(Error::MissingFeature {
            customer_id: customer_id.clone(),
            field: feature.key(),
        }),
        _ => Err(Error::invalid_input(
            customer_id,
            feature.key(),
            "expected a number",
        )),
    }
}

fn categorical_value(customer_id: &Str, feature: Feature, value: &FeatureValue) -> Result<Str> {
    match value {
        FeatureValue::String(s) if !s.trim().is_empty() => Ok(Str::from(s.trim())),
        FeatureValue::String(_) | FeatureValue::Null => Err(Error::MissingFeature {
            customer_id: customer_id.clone(),
            field: feature.key(),
        }),
        FeatureValue::Boolean(b) => Ok(Str::from(yes_no(*b))),
        FeatureValue::Number(_) => Err(Error::invalid_input(
            customer_id,
            feature.key(),
            "expected a string",
        )),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Purchase-frequency label, ordered from least to most frequent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrequencyBand {
    #[serde(rename = "Annually")]
    Annually,
    #[serde(rename = "Every 3 Months")]
    Every3Months,
    #[serde(rename = "Quarterly")]
    Quarterly,
    #[serde(rename = "Monthly")]
    Monthly,
    #[serde(rename = "Fortnightly")]
    Fortnightly,
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    #[serde(rename = "Weekly")]
    Weekly,
}

impl FrequencyBand {
    /// All bands, in ordinal order.
    pub const ALL: [FrequencyBand; 7] = [
        FrequencyBand::Annually,
        FrequencyBand::Every3Months,
        FrequencyBand::Quarterly,
        FrequencyBand::Monthly,
        FrequencyBand::Fortnightly,
        FrequencyBand::BiWeekly,
        FrequencyBand::Weekly,
    ];

    /// Ordinal score on the 1–7 scale the frequency regressor is trained on.
    pub const fn score(self) -> u8 {
        match self {
            FrequencyBand::Annually => 1,
            FrequencyBand::Every3Months => 2,
            FrequencyBand::Quarterly => 3,
            FrequencyBand::Monthly => 4,
            FrequencyBand::Fortnightly => 5,
            FrequencyBand::BiWeekly => 6,
            FrequencyBand::Weekly => 7,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FrequencyBand::Annually => "Annually",
            FrequencyBand::Every3Months => "Every 3 Months",
            FrequencyBand::Quarterly => "Quarterly",
            FrequencyBand::Monthly => "Monthly",
            FrequencyBand::Fortnightly => "Fortnightly",
            FrequencyBand::BiWeekly => "Bi-Weekly",
            FrequencyBand::Weekly => "Weekly",
        }
    }

    pub fn from_label(label: &str) -> Option<FrequencyBand> {
        FrequencyBand::ALL
            .into_iter()
            .find(|band| band.label() == label)
    }

    /// Band closest to a (possibly fractional) frequency score. Scores outside 1–7 map to the
    /// nearest end of the scale; halves round up.
    pub fn nearest(score: f64) -> FrequencyBand {
        let index = (score.clamp(1.0, 7.0).round() as usize).saturating_sub(1);
        FrequencyBand::ALL[index.min(FrequencyBand::ALL.len() - 1)]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs::File;

    use super::*;

    pub(crate) fn sample_customers() -> Vec<CustomerRecord> {
        serde_json::from_reader(File::open("../test-data/customers.json").unwrap()).unwrap()
    }

    #[test]
    fn parses_dataset_column_headers() {
        let record: CustomerRecord = serde_json::from_str(
            r#"{
                "Customer ID": "7",
                "Age": 31,
                "Purchase Amount (USD)": 20.0,
                "Previous Purchases": 3,
                "Review Rating": 4.5,
                "Gender": "Female",
                "Item Purchased": "Jeans",
                "Category": "Clothing",
                "Location": "Texas",
                "Size": "S",
                "Color": "Black",
                "Season": "Summer",
                "Shipping Type": "Standard",
                "Discount Applied": "No",
                "Promo Code Used": "No",
                "Payment Method": "Cash",
                "Frequency of Purchases": "Every 3 Months"
            }"#,
        )
        .unwrap();

        assert_eq!(&*record.customer_id, "7");
        assert_eq!(record.purchase_amount, 20.0);
        assert_eq!(&*record.shipping_type, "Standard");
        assert_eq!(
            record.frequency_of_purchases,
            Some(FrequencyBand::Every3Months)
        );
        assert_eq!(record.subscription_status, None);
    }

    #[test]
    fn from_attributes_reports_missing_field() {
        let mut values: FieldValues = serde_json::from_str(
            &serde_json::to_string(&sample_customers()[0]).unwrap(),
        )
        .unwrap();
        assert!(CustomerRecord::from_attributes(&values).is_ok());

        values.remove("review_rating");
        match CustomerRecord::from_attributes(&values) {
            Err(Error::MissingFeature { customer_id, field }) => {
                assert_eq!(&*customer_id, "1");
                assert_eq!(field, "review_rating");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn from_attributes_rejects_wrong_types() {
        let mut values: FieldValues = serde_json::from_str(
            &serde_json::to_string(&sample_customers()[0]).unwrap(),
        )
        .unwrap();
        values.insert("age".to_owned(), "fifty".into());

        assert!(matches!(
            CustomerRecord::from_attributes(&values),
            Err(Error::InvalidInput { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn validate_flags_nan_and_infinite_values() {
        let mut record = sample_customers()[0].clone();
        assert!(record.validate().is_ok());

        record.age = f64::NAN;
        assert!(matches!(
            record.validate(),
            Err(Error::MissingFeature { field: "age", .. })
        ));

        record.age = f64::INFINITY;
        assert!(matches!(
            record.validate(),
            Err(Error::InvalidInput { ref field, .. }) if field == "age"
        ));

        let mut record = sample_customers()[0].clone();
        record.color = "".into();
        assert!(matches!(
            record.validate(),
            Err(Error::MissingFeature { field: "color", .. })
        ));

        let mut record = sample_customers()[0].clone();
        record.season = " \t".into();
        assert!(matches!(
            record.validate(),
            Err(Error::MissingFeature { field: "season", ref customer_id }) if &**customer_id == "1"
        ));
    }

    #[test]
    fn with_changes_leaves_original_untouched() {
        let base = sample_customers()[0].clone();
        let changes: FieldValues = [
            ("Shipping Type".to_owned(), "Standard".into()),
            ("discount_applied".to_owned(), false.into()),
            ("age".to_owned(), 30.0.into()),
        ]
        .into();

        let modified = base
            .with_changes(&changes, UnknownFieldPolicy::Ignore)
            .unwrap();

        assert_eq!(&*modified.shipping_type, "Standard");
        assert_eq!(&*modified.discount_applied, "No");
        assert_eq!(modified.age, 30.0);
        assert_eq!(base, sample_customers()[0]);
    }

    #[test]
    fn unknown_fields_follow_policy() {
        let base = sample_customers()[0].clone();
        let changes: FieldValues = [
            ("favorite_store".to_owned(), "Downtown".into()),
            ("customer_id".to_owned(), "999".into()),
        ]
        .into();

        let modified = base
            .with_changes(&changes, UnknownFieldPolicy::Ignore)
            .unwrap();
        assert_eq!(modified, base);

        assert!(matches!(
            base.with_changes(&changes, UnknownFieldPolicy::Reject),
            Err(Error::UnknownField { ref customer_id, ref field })
                if field == "customer_id" && &**customer_id == "1"
        ));
    }

    #[test]
    fn set_rejects_type_mismatch() {
        let mut record = sample_customers()[0].clone();
        assert!(matches!(
            record.set(Feature::Season, &FeatureValue::Number(3.0)),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            record.set(Feature::Age, &FeatureValue::Null),
            Err(Error::MissingFeature { field: "age", .. })
        ));
        assert!(matches!(
            record.set(Feature::Age, &FeatureValue::Number(f64::NAN)),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn frequency_band_nearest() {
        assert_eq!(FrequencyBand::nearest(-5.0), FrequencyBand::Annually);
        assert_eq!(FrequencyBand::nearest(5.5), FrequencyBand::BiWeekly);
        assert_eq!(FrequencyBand::nearest(5.49), FrequencyBand::Fortnightly);
        assert_eq!(FrequencyBand::nearest(99.0), FrequencyBand::Weekly);
        for band in FrequencyBand::ALL {
            assert_eq!(FrequencyBand::nearest(band.score() as f64), band);
            assert_eq!(FrequencyBand::from_label(band.label()), Some(band));
        }
    }
}
