//! The feature contract: the fixed, ordered set of inputs every model consumes.
//!
//! Both models see features in [`FEATURE_CONTRACT`] order (numeric features first, then
//! categorical ones). Model artifacts are validated against this order when they are loaded, so
//! a model trained on a different column layout can never be used for scoring.

use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Numeric model inputs, in contract order.
pub const NUMERIC_FEATURES: [Feature; 4] = [
    Feature::Age,
    Feature::PurchaseAmount,
    Feature::PreviousPurchases,
    Feature::ReviewRating,
];

/// Categorical model inputs, in contract order.
pub const CATEGORICAL_FEATURES: [Feature; 11] = [
    Feature::Gender,
    Feature::ItemPurchased,
    Feature::Category,
    Feature::Location,
    Feature::Size,
    Feature::Color,
    Feature::Season,
    Feature::ShippingType,
    Feature::DiscountApplied,
    Feature::PromoCodeUsed,
    Feature::PaymentMethod,
];

/// All model inputs in the exact order used to build input vectors.
pub const FEATURE_CONTRACT: [Feature; 15] = [
    Feature::Age,
    Feature::PurchaseAmount,
    Feature::PreviousPurchases,
    Feature::ReviewRating,
    Feature::Gender,
    Feature::ItemPurchased,
    Feature::Category,
    Feature::Location,
    Feature::Size,
    Feature::Color,
    Feature::Season,
    Feature::ShippingType,
    Feature::DiscountApplied,
    Feature::PromoCodeUsed,
    Feature::PaymentMethod,
];

/// Whether a feature is quantitative or an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Real-valued; standardized before reaching the estimator.
    Numeric,
    /// Finite set of levels; one-hot encoded before reaching the estimator.
    Categorical,
}

/// A single model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Age,
    PurchaseAmount,
    PreviousPurchases,
    ReviewRating,
    Gender,
    ItemPurchased,
    Category,
    Location,
    Size,
    Color,
    Season,
    ShippingType,
    DiscountApplied,
    PromoCodeUsed,
    PaymentMethod,
}

impl Feature {
    /// Snake-case key used in records, artifacts and encoded feature names.
    pub const fn key(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::PurchaseAmount => "purchase_amount",
            Feature::PreviousPurchases => "previous_purchases",
            Feature::ReviewRating => "review_rating",
            Feature::Gender => "gender",
            Feature::ItemPurchased => "item_purchased",
            Feature::Category => "category",
            Feature::Location => "location",
            Feature::Size => "size",
            Feature::Color => "color",
            Feature::Season => "season",
            Feature::ShippingType => "shipping_type",
            Feature::DiscountApplied => "discount_applied",
            Feature::PromoCodeUsed => "promo_code_used",
            Feature::PaymentMethod => "payment_method",
        }
    }

    /// Column header of the shopping-behavior dataset this feature comes from.
    pub const fn column_name(self) -> &'static str {
        match self {
            Feature::Age => "Age",
            Feature::PurchaseAmount => "Purchase Amount (USD)",
            Feature::PreviousPurchases => "Previous Purchases",
            Feature::ReviewRating => "Review Rating",
            Feature::Gender => "Gender",
            Feature::ItemPurchased => "Item Purchased",
            Feature::Category => "Category",
            Feature::Location => "Location",
            Feature::Size => "Size",
            Feature::Color => "Color",
            Feature::Season => "Season",
            Feature::ShippingType => "Shipping Type",
            Feature::DiscountApplied => "Discount Applied",
            Feature::PromoCodeUsed => "Promo Code Used",
            Feature::PaymentMethod => "Payment Method",
        }
    }

    pub const fn kind(self) -> FeatureKind {
        match self {
            Feature::Age
            | Feature::PurchaseAmount
            | Feature::PreviousPurchases
            | Feature::ReviewRating => FeatureKind::Numeric,
            _ => FeatureKind::Categorical,
        }
    }

    /// Look up a feature by its snake-case key or its dataset column header.
    ///
    /// Returns `None` for anything outside the contract, including the customer identifier and
    /// label columns.
    pub fn from_key(key: &str) -> Option<Feature> {
        FEATURE_CONTRACT
            .into_iter()
            .find(|feature| feature.key() == key || feature.column_name() == key)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Untyped map of field values, as supplied by data stores and scenario requests.
pub type FieldValues = HashMap<String, FeatureValue>;

/// Value of a single field.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, and `bool` types.
///
/// ```
/// # use loyalty_core::FeatureValue;
/// let shipping: FeatureValue = "Express".into();
/// let age: FeatureValue = 42.0.into();
/// let discount: FeatureValue = true.into();
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, From, Clone)]
#[serde(untagged)]
pub enum FeatureValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value. Stored as `"Yes"`/`"No"` when set on a categorical field.
    Boolean(bool),
    /// A null value or absence of value.
    #[from(ignore)]
    Null,
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
