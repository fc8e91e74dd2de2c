//! Complementary products, upsells, bundles and cart analysis
//!
//! Two sources feed complementary suggestions: association rules mined from
//! transactions and a category adjacency table. Both resolve against the loaded
//! product catalog; candidates without metadata are never suggested.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::domain::product::{ProductId, ProductMetadata};
use crate::errors::DomainError;
use crate::scoring::criteria::piecewise;

use super::rules::AssociationRulesMiner;
use super::types::{
    AnalyzerSettings, Bundle, CartAnalysis, ComplementaryProduct, MinerThresholds,
    RecommendationMetric, RecommendationSource, Transaction, UpsellProduct,
};

/// Share of a candidate's quality score credited to category adjacency.
const CATEGORY_SCORE_FACTOR: f64 = 0.6;

const UPSELL_QUALITY_WEIGHT: f64 = 0.6;
const UPSELL_PREMIUM_WEIGHT: f64 = 0.4;

/// Upgrade price ratio -> fit. Premiums up to 50% fit fully.
const PREMIUM_FIT: &[(f64, f64)] = &[(1.5, 100.0), (2.0, 50.0), (3.0, 10.0), (5.0, 0.0)];

/// Category adjacency used until `load_category_relationships` replaces it.
pub fn default_category_relationships() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("electronics", &["accessories", "audio", "cables", "power"]),
        ("accessories", &["electronics", "fashion"]),
        ("audio", &["electronics", "accessories"]),
        ("fashion", &["accessories", "jewelry", "footwear", "beauty"]),
        ("footwear", &["fashion", "accessories"]),
        ("jewelry", &["fashion", "accessories"]),
        ("beauty", &["skincare", "fragrance", "accessories"]),
        ("skincare", &["beauty", "fragrance"]),
        ("home_decor", &["lighting", "textiles", "furniture"]),
        ("lighting", &["home_decor", "furniture"]),
        ("kitchen", &["home_decor", "textiles"]),
        ("fitness", &["sportswear", "supplements", "fitness_accessories"]),
        ("sportswear", &["fitness", "footwear"]),
        ("pet", &["pet_accessories", "pet_food"]),
        ("toys", &["books", "games"]),
    ];

    table
        .iter()
        .map(|(category, related)| {
            ((*category).to_owned(), related.iter().map(|name| (*name).to_owned()).collect())
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ComplementaryAnalyzer {
    miner: AssociationRulesMiner,
    settings: AnalyzerSettings,
    catalog: Option<BTreeMap<ProductId, ProductMetadata>>,
    category_relationships: BTreeMap<String, BTreeSet<String>>,
}

impl ComplementaryAnalyzer {
    pub fn new(
        thresholds: MinerThresholds,
        settings: AnalyzerSettings,
    ) -> Result<Self, DomainError> {
        settings.validate()?;
        Ok(Self::assemble(AssociationRulesMiner::new(thresholds)?, settings))
    }

    fn assemble(miner: AssociationRulesMiner, settings: AnalyzerSettings) -> Self {
        let mut analyzer =
            Self { miner, settings, catalog: None, category_relationships: BTreeMap::new() };
        analyzer.load_category_relationships(default_category_relationships());
        analyzer
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn miner(&self) -> &AssociationRulesMiner {
        &self.miner
    }

    /// Fits the rule miner. Returns the number of rules mined.
    pub fn load_transactions(
        &mut self,
        transactions: &[Transaction],
    ) -> Result<usize, DomainError> {
        self.miner.fit(transactions)
    }

    /// Replaces the product catalog. Later duplicates win.
    pub fn load_product_metadata<I>(&mut self, products: I) -> Result<usize, DomainError>
    where
        I: IntoIterator<Item = ProductMetadata>,
    {
        let mut catalog = BTreeMap::new();
        for product in products {
            if product.id.as_str().trim().is_empty() {
                return Err(DomainError::InvalidInput("product metadata requires an id".to_owned()));
            }
            if product.price < Decimal::ZERO {
                return Err(DomainError::InvalidInput(format!(
                    "product `{}` has a negative price",
                    product.id
                )));
            }
            catalog.insert(product.id.clone(), product);
        }

        let loaded = catalog.len();
        debug!(
            event_name = "recommend.catalog.loaded",
            products = loaded,
            "product catalog loaded"
        );
        self.catalog = Some(catalog);
        Ok(loaded)
    }

    /// Replaces the category adjacency table. Relationships are directional.
    pub fn load_category_relationships(&mut self, relationships: BTreeMap<String, Vec<String>>) {
        self.category_relationships = relationships
            .into_iter()
            .map(|(category, related)| {
                (
                    normalize_category(&category),
                    related.iter().map(|name| normalize_category(name)).collect(),
                )
            })
            .collect();
    }

    /// Top complementary products for `product_id`, best first.
    /// Unknown products yield an empty list. `None` caps the list at
    /// `settings().max_complementary`.
    pub fn get_complementary_products(
        &self,
        product_id: &ProductId,
        max_products: Option<usize>,
    ) -> Result<Vec<ComplementaryProduct>, DomainError> {
        let catalog = self.catalog()?;
        let Some(seed) = catalog.get(product_id) else {
            return Ok(Vec::new());
        };

        let mut candidates = self.complementary_candidates(seed, catalog);
        candidates.truncate(max_products.unwrap_or(self.settings.max_complementary));
        Ok(candidates)
    }

    /// Same-category products priced above `product_id`, best first.
    /// `None` caps the list at `settings().max_upsells`.
    pub fn get_upsell_products(
        &self,
        product_id: &ProductId,
        max_products: Option<usize>,
    ) -> Result<Vec<UpsellProduct>, DomainError> {
        let catalog = self.catalog()?;
        let Some(seed) = catalog.get(product_id) else {
            return Ok(Vec::new());
        };

        let mut upsells = upsell_candidates(seed, catalog);
        upsells.truncate(max_products.unwrap_or(self.settings.max_upsells));
        Ok(upsells)
    }

    /// Bundles of the given products plus one strong complementary item each.
    /// Empty when any seed is unknown.
    pub fn bundle_products(&self, product_ids: &[ProductId]) -> Result<Vec<Bundle>, DomainError> {
        let catalog = self.catalog()?;

        let mut seed_ids: BTreeSet<ProductId> = BTreeSet::new();
        let mut seeds: Vec<&ProductMetadata> = Vec::new();
        for id in product_ids {
            let Some(seed) = catalog.get(id) else {
                return Ok(Vec::new());
            };
            if seed_ids.insert(id.clone()) {
                seeds.push(seed);
            }
        }
        if seeds.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = merge_best(
            seeds.iter().flat_map(|seed| self.complementary_candidates(seed, catalog)),
            &seed_ids,
        );

        let mut bundles = Vec::new();
        for candidate in candidates.into_iter().take(self.settings.bundle_candidates) {
            let mut products: Vec<ProductMetadata> =
                seeds.iter().map(|seed| (*seed).clone()).collect();
            products.push(candidate.product);
            if let Some(bundle) = self.price_bundle(products, candidate.score) {
                bundles.push(bundle);
            }
        }
        Ok(bundles)
    }

    /// Summarizes a cart: value, gaps, upgrades and bundle options.
    pub fn analyze_cart(&self, product_ids: &[ProductId]) -> Result<CartAnalysis, DomainError> {
        let catalog = self.catalog()?;

        let cart: BTreeSet<ProductId> = product_ids.iter().cloned().collect();
        let mut known: Vec<&ProductMetadata> = Vec::new();
        for product in product_ids.iter().filter_map(|id| catalog.get(id)) {
            if !known.iter().any(|existing| existing.id == product.id) {
                known.push(product);
            }
        }

        let cart_value: Decimal = known.iter().map(|product| product.price).sum();
        let limit = self.settings.max_cart_suggestions;

        let complements: Vec<Vec<ComplementaryProduct>> =
            known.iter().map(|product| self.complementary_candidates(product, catalog)).collect();

        let mut missing_complementary = merge_best(complements.iter().flatten().cloned(), &cart);
        missing_complementary.truncate(limit);

        let mut potential_upsells: Vec<UpsellProduct> = Vec::new();
        for product in &known {
            let best = upsell_candidates(product, catalog)
                .into_iter()
                .find(|upsell| !cart.contains(&upsell.product.id));
            if let Some(upsell) = best {
                let seen = potential_upsells
                    .iter()
                    .any(|existing| existing.product.id == upsell.product.id);
                if !seen {
                    potential_upsells.push(upsell);
                }
            }
        }
        potential_upsells.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| a.product.id.cmp(&b.product.id))
        });
        potential_upsells.truncate(limit);

        let known_ids: Vec<ProductId> = known.iter().map(|product| product.id.clone()).collect();
        let bundle_opportunities = self.bundle_products(&known_ids)?;

        let cart_score = cart_gap_score(&complements, &cart);

        Ok(CartAnalysis {
            cart_value,
            product_count: cart.len(),
            missing_complementary,
            potential_upsells,
            bundle_opportunities,
            cart_score,
        })
    }

    fn catalog(&self) -> Result<&BTreeMap<ProductId, ProductMetadata>, DomainError> {
        self.catalog.as_ref().ok_or_else(|| {
            DomainError::NotConfigured("product metadata has not been loaded".to_owned())
        })
    }

    /// Every complementary candidate for `seed`, unbounded, best first.
    fn complementary_candidates(
        &self,
        seed: &ProductMetadata,
        catalog: &BTreeMap<ProductId, ProductMetadata>,
    ) -> Vec<ComplementaryProduct> {
        let mut candidates: Vec<ComplementaryProduct> = Vec::new();

        for recommendation in self.miner.get_product_recommendations_by(
            std::slice::from_ref(&seed.id),
            None,
            RecommendationMetric::Confidence,
        ) {
            if let Some(product) = catalog.get(&recommendation.product) {
                candidates.push(ComplementaryProduct {
                    product: product.clone(),
                    score: round2((recommendation.confidence * 100.0).clamp(0.0, 100.0)),
                    source: RecommendationSource::Rules,
                });
            }
        }

        let seed_category = normalize_category(&seed.category);
        if let Some(related) = self.category_relationships.get(&seed_category) {
            for product in catalog.values() {
                let adjacent = related.contains(&normalize_category(&product.category));
                if product.id != seed.id && adjacent {
                    candidates.push(ComplementaryProduct {
                        product: product.clone(),
                        score: round2(CATEGORY_SCORE_FACTOR * product.quality_score()),
                        source: RecommendationSource::Category,
                    });
                }
            }
        }

        let exclude = BTreeSet::from([seed.id.clone()]);
        merge_best(candidates, &exclude)
    }

    fn price_bundle(&self, products: Vec<ProductMetadata>, score: f64) -> Option<Bundle> {
        let original_price: Decimal = products.iter().map(|product| product.price).sum();
        if original_price <= Decimal::ZERO {
            return None;
        }

        let extra_items = products.len().saturating_sub(2) as f64;
        let discount = (self.settings.base_bundle_discount
            + self.settings.per_item_bundle_discount * extra_items)
            .min(self.settings.max_bundle_discount);
        let discount_percentage = Decimal::from_f64(discount)?.round_dp(2);
        if discount_percentage <= Decimal::ZERO {
            return None;
        }

        let bundle_price = (original_price * (Decimal::ONE_HUNDRED - discount_percentage)
            / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);

        Some(Bundle {
            product_ids: products.iter().map(|product| product.id.clone()).collect(),
            original_price,
            savings: original_price - bundle_price,
            bundle_price,
            discount_percentage,
            products,
            score,
        })
    }
}

impl Default for ComplementaryAnalyzer {
    fn default() -> Self {
        Self::assemble(AssociationRulesMiner::default(), AnalyzerSettings::default())
    }
}

fn upsell_candidates(
    seed: &ProductMetadata,
    catalog: &BTreeMap<ProductId, ProductMetadata>,
) -> Vec<UpsellProduct> {
    let Some(seed_price) = seed.price.to_f64().filter(|price| *price > 0.0) else {
        return Vec::new();
    };
    let category = normalize_category(&seed.category);

    let mut upsells: Vec<UpsellProduct> = catalog
        .values()
        .filter(|product| {
            product.id != seed.id
                && product.price > seed.price
                && normalize_category(&product.category) == category
        })
        .filter_map(|product| {
            let price_ratio = product.price.to_f64()? / seed_price;
            let score = UPSELL_QUALITY_WEIGHT * product.quality_score()
                + UPSELL_PREMIUM_WEIGHT * piecewise(price_ratio, PREMIUM_FIT);
            Some(UpsellProduct {
                product: product.clone(),
                score: round2(score),
                price_difference: product.price - seed.price,
                price_ratio: (price_ratio * 10_000.0).round() / 10_000.0,
                source: RecommendationSource::Category,
            })
        })
        .collect();

    upsells.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| a.product.id.cmp(&b.product.id))
    });
    upsells
}

/// Keeps the best-scoring entry per product, drops `exclude`, and orders by
/// score descending then product id. Rule-sourced entries win ties.
fn merge_best<I>(candidates: I, exclude: &BTreeSet<ProductId>) -> Vec<ComplementaryProduct>
where
    I: IntoIterator<Item = ComplementaryProduct>,
{
    let mut best: BTreeMap<ProductId, ComplementaryProduct> = BTreeMap::new();
    for candidate in candidates {
        if exclude.contains(&candidate.product.id) {
            continue;
        }
        let replace = match best.get(&candidate.product.id) {
            None => true,
            Some(existing) => {
                candidate.score > existing.score
                    || (candidate.score == existing.score
                        && candidate.source == RecommendationSource::Rules
                        && existing.source != RecommendationSource::Rules)
            }
        };
        if replace {
            best.insert(candidate.product.id.clone(), candidate);
        }
    }

    let mut merged: Vec<ComplementaryProduct> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| a.product.id.cmp(&b.product.id))
    });
    merged
}

/// Noisy-OR over per-item coverage: each item contributes the share of its
/// complementary weight still missing from the cart. Items without
/// complements are neutral. Adding items can only lower the gap.
fn cart_gap_score(complements: &[Vec<ComplementaryProduct>], cart: &BTreeSet<ProductId>) -> f64 {
    let remaining: f64 = complements
        .iter()
        .map(|candidates| {
            let total: f64 = candidates.iter().map(|candidate| candidate.score).sum();
            if total <= 0.0 {
                return 1.0;
            }
            let covered: f64 = candidates
                .iter()
                .filter(|candidate| cart.contains(&candidate.product.id))
                .map(|candidate| candidate.score)
                .sum();
            1.0 - (covered / total).clamp(0.0, 1.0)
        })
        .product();

    round2(100.0 * remaining)
}

fn normalize_category(category: &str) -> String {
    crate::scoring::normalize_niche(category)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
