//! Types for rule mining and complementary recommendations

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::product::{ProductId, ProductMetadata};
use crate::errors::DomainError;

/// One co-occurrence event, e.g. the distinct products of a completed order.
pub type Transaction = BTreeSet<ProductId>;

/// Largest itemset the miner will ever grow. Rule derivation enumerates every
/// split of an itemset, so this also bounds the per-itemset work.
pub const MAX_ITEMSET_SIZE: usize = 16;

/// Itemset cap used unless configured otherwise.
pub const DEFAULT_MAX_ITEMSET_SIZE: usize = 4;

/// Hard filters applied to every mined rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinerThresholds {
    pub min_support: f64,
    pub min_confidence: f64,
    pub min_lift: f64,
    /// Largest itemset considered; `None` mines up to [`MAX_ITEMSET_SIZE`].
    #[serde(default)]
    pub max_itemset_size: Option<usize>,
}

impl Default for MinerThresholds {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            min_confidence: 0.1,
            min_lift: 1.0,
            max_itemset_size: Some(DEFAULT_MAX_ITEMSET_SIZE),
        }
    }
}

impl MinerThresholds {
    pub fn new(min_support: f64, min_confidence: f64, min_lift: f64) -> Self {
        Self { min_support, min_confidence, min_lift, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.min_support) {
            return Err(DomainError::InvalidConfig("min_support must be in range 0..=1".to_owned()));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(DomainError::InvalidConfig(
                "min_confidence must be in range 0..=1".to_owned(),
            ));
        }
        if !self.min_lift.is_finite() || self.min_lift < 0.0 {
            return Err(DomainError::InvalidConfig("min_lift must be >= 0".to_owned()));
        }
        if self.max_itemset_size.is_some_and(|size| !(2..=MAX_ITEMSET_SIZE).contains(&size)) {
            return Err(DomainError::InvalidConfig(format!(
                "max_itemset_size must be in range 2..={MAX_ITEMSET_SIZE} when set"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemset {
    pub items: BTreeSet<ProductId>,
    pub support: f64,
}

/// "Baskets containing the antecedent also tend to contain the consequent."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: BTreeSet<ProductId>,
    pub consequent: BTreeSet<ProductId>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl AssociationRule {
    pub fn involves(&self, product_id: &ProductId) -> bool {
        self.antecedent.contains(product_id) || self.consequent.contains(product_id)
    }
}

/// Statistic used to rank rule-based recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationMetric {
    #[default]
    Lift,
    Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecommendation {
    pub product: ProductId,
    /// Lift or confidence of the best supporting rule, per the chosen metric.
    pub score: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub antecedent: BTreeSet<ProductId>,
}

/// Where a complementary suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Rules,
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplementaryProduct {
    pub product: ProductMetadata,
    /// 0-100
    pub score: f64,
    pub source: RecommendationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsellProduct {
    pub product: ProductMetadata,
    /// 0-100
    pub score: f64,
    pub price_difference: Decimal,
    pub price_ratio: f64,
    pub source: RecommendationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub product_ids: Vec<ProductId>,
    pub products: Vec<ProductMetadata>,
    pub original_price: Decimal,
    pub bundle_price: Decimal,
    pub savings: Decimal,
    pub discount_percentage: Decimal,
    /// Score of the complementary item that completes the bundle.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartAnalysis {
    pub cart_value: Decimal,
    pub product_count: usize,
    pub missing_complementary: Vec<ComplementaryProduct>,
    pub potential_upsells: Vec<UpsellProduct>,
    pub bundle_opportunities: Vec<Bundle>,
    /// Completeness gap, 0 (complete) to 100 (nothing of what usually goes
    /// with these products is in the cart). Never rises as items are added.
    pub cart_score: f64,
}

/// Smallest bundle discount in percent. Discounts are applied at two decimal
/// places, so anything smaller would leave the bundle at full price.
pub const MIN_BUNDLE_DISCOUNT: f64 = 0.01;

/// Limits and discount policy for the complementary analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    pub max_complementary: usize,
    pub max_upsells: usize,
    pub bundle_candidates: usize,
    /// Discount % for a two-item bundle.
    pub base_bundle_discount: f64,
    /// Extra discount % per item beyond two.
    pub per_item_bundle_discount: f64,
    pub max_bundle_discount: f64,
    pub max_cart_suggestions: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            max_complementary: 5,
            max_upsells: 3,
            bundle_candidates: 3,
            base_bundle_discount: 5.0,
            per_item_bundle_discount: 2.5,
            max_bundle_discount: 15.0,
            max_cart_suggestions: 5,
        }
    }
}

impl AnalyzerSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        let in_range = |value: f64| value.is_finite() && (0.0..100.0).contains(&value);
        if !in_range(self.base_bundle_discount)
            || self.base_bundle_discount < MIN_BUNDLE_DISCOUNT
        {
            return Err(DomainError::InvalidConfig(format!(
                "base_bundle_discount must be at least {MIN_BUNDLE_DISCOUNT} and below 100"
            )));
        }
        if !in_range(self.per_item_bundle_discount) {
            return Err(DomainError::InvalidConfig(
                "per_item_bundle_discount must be in range 0..100".to_owned(),
            ));
        }
        if !in_range(self.max_bundle_discount)
            || self.max_bundle_discount < self.base_bundle_discount
        {
            return Err(DomainError::InvalidConfig(
                "max_bundle_discount must be below 100 and not less than base_bundle_discount"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

/// Reads transactions from JSON: an array whose items are arrays of product
/// ids (strings or numbers).
pub fn transactions_from_json(value: &Value) -> Result<Vec<Transaction>, DomainError> {
    let Some(rows) = value.as_array() else {
        return Err(DomainError::InvalidInput("transactions must be a JSON array".to_owned()));
    };

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let Some(items) = row.as_array() else {
                return Err(DomainError::InvalidInput(format!(
                    "transaction {index} must be an array of product ids"
                )));
            };
            items
                .iter()
                .map(|item| match item {
                    Value::String(id) if !id.trim().is_empty() => Ok(ProductId::new(id.trim())),
                    Value::Number(number) => Ok(ProductId::new(number.to_string())),
                    _ => Err(DomainError::InvalidInput(format!(
                        "transaction {index} contains an invalid product id"
                    ))),
                })
                .collect::<Result<Transaction, _>>()
        })
        .collect()
}
