//! Product scorer implementation

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::domain::signal::{identity_of, ProductSignal};
use crate::errors::DomainError;

use super::criteria::{self, CriterionRegistry};
use super::multicriteria::{
    apply_niche_optimizations, calculate_category_score, calculate_confidence,
    calculate_overall_score, deep_merge, default_scorer_config, find_niche_profile,
    generate_score_explanation, get_recommendation, identify_strengths_weaknesses, normalize_config,
    round_score,
};
use super::niche::{default_niche_table, NicheProfile};
use super::types::*;

/// Contract shared by scorer variants.
pub trait ProductScorer {
    /// Scores one product. Fails only when `product_data` violates the signal
    /// contract (not an object, or a known section with the wrong shape).
    fn score_product(&self, product_data: &Value) -> Result<ScoreResult, DomainError>;

    /// Rebuilds the explanation from a previously produced result.
    fn explain_score(&self, result: &ScoreResult) -> ScoreExplanation;

    fn default_config() -> ScorerConfig
    where
        Self: Sized;

    fn config(&self) -> &ScorerConfig;

    fn get_recommendation(&self, score: f64) -> Recommendation {
        get_recommendation(score, &self.config().thresholds)
    }

    /// Scores each product independently. A failing product becomes an inline
    /// error record at its position; the rest of the batch proceeds.
    fn batch_score_products(&self, products: &[Value]) -> Vec<BatchEntry> {
        products
            .iter()
            .enumerate()
            .map(|(index, product)| match self.score_product(product) {
                Ok(result) => BatchEntry::Scored(Box::new(result)),
                Err(error) => {
                    let (product_id, product_name) = identity_of(product);
                    debug!(
                        event_name = "scoring.batch.item_failed",
                        index,
                        product_id = product_id.as_deref().unwrap_or("unknown"),
                        error = %error,
                        "product could not be scored"
                    );
                    BatchEntry::Failed(ErrorRecord {
                        error: error.to_string(),
                        product_id,
                        product_name,
                    })
                }
            })
            .collect()
    }
}

/// Weighted multicriteria scorer with per-niche weighting profiles.
#[derive(Debug, Clone)]
pub struct AdvancedProductScorer {
    config: ScorerConfig,
    functions: CriterionRegistry,
    niche_table: Vec<NicheProfile>,
}

impl AdvancedProductScorer {
    /// Create a scorer with the default configuration and niche catalog
    pub fn new() -> Self {
        Self::with_config(default_scorer_config())
    }

    pub fn with_config(config: ScorerConfig) -> Self {
        Self { config, functions: criteria::registry(), niche_table: default_niche_table() }
    }

    /// Replace the niche catalog
    pub fn with_niche_table(mut self, niche_table: Vec<NicheProfile>) -> Self {
        self.niche_table = niche_table;
        self
    }

    pub fn niche_table(&self) -> &[NicheProfile] {
        &self.niche_table
    }

    /// Scores with an explicit niche instead of the one found in `basic_info`.
    pub fn score_product_for_niche(
        &self,
        product_data: &Value,
        niche: Option<&str>,
    ) -> Result<ScoreResult, DomainError> {
        let signal = ProductSignal::from_value(product_data.clone())?;
        Ok(self.score_signal(&signal, niche))
    }

    /// Scores an already validated signal.
    pub fn score_signal(&self, signal: &ProductSignal, niche: Option<&str>) -> ScoreResult {
        let applied_niche = niche
            .filter(|_| self.config.niche_adjustments)
            .and_then(|niche| find_niche_profile(niche, &self.niche_table))
            .map(|profile| profile.key.clone());
        let config = match niche.filter(|_| applied_niche.is_some()) {
            Some(niche) => apply_niche_optimizations(&self.config, niche, &self.niche_table),
            None => self.config.clone(),
        };

        let mut category_scores = BTreeMap::new();
        for category in Category::ALL {
            let criteria = config.criteria.get(&category).map(Vec::as_slice).unwrap_or(&[]);
            let score = calculate_category_score(category, criteria, signal, &self.functions);
            category_scores.insert(category, round_score(score));
        }

        let criterion_scores: BTreeMap<String, f64> = config
            .criteria
            .values()
            .flatten()
            .filter_map(|criterion| {
                criteria::evaluate(&self.functions, &criterion.name, signal)
                    .map(|score| (criterion.name.clone(), round_score(score)))
            })
            .collect();

        let overall_score = round_score(calculate_overall_score(&category_scores, &config.weights));
        let confidence = round_score(calculate_confidence(
            signal,
            &category_scores,
            &config.critical_criteria,
            &self.functions,
        ));
        let (strengths, weaknesses) = identify_strengths_weaknesses(&category_scores, &config);
        let recommendation = get_recommendation(overall_score, &config.thresholds);
        let explanation = generate_score_explanation(
            overall_score,
            &strengths,
            &weaknesses,
            confidence,
            &config.thresholds,
        );

        let product_id = signal.product_id();
        debug!(
            event_name = "scoring.product.scored",
            product_id = product_id.as_deref().unwrap_or("unknown"),
            niche = applied_niche.as_deref().unwrap_or("default"),
            overall_score,
            confidence,
            "product scored"
        );

        ScoreResult {
            product_id,
            product_name: signal.product_name(),
            niche: applied_niche,
            overall_score,
            category_scores,
            criterion_scores,
            recommendation,
            confidence,
            strengths,
            weaknesses,
            explanation,
        }
    }

    /// Deep-merges `updates` into the live configuration and re-normalizes the
    /// weights. Invalid results are rejected and the previous configuration is kept.
    pub fn update_config(&mut self, updates: &Value) -> Result<(), DomainError> {
        let mut merged = serde_json::to_value(&self.config)
            .map_err(|error| DomainError::InvalidConfig(error.to_string()))?;
        deep_merge(&mut merged, updates);

        let mut config: ScorerConfig = serde_json::from_value(merged)
            .map_err(|error| DomainError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        normalize_config(&mut config);

        debug!(event_name = "scoring.config.updated", "scorer configuration updated");
        self.config = config;
        Ok(())
    }
}

impl Default for AdvancedProductScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductScorer for AdvancedProductScorer {
    fn score_product(&self, product_data: &Value) -> Result<ScoreResult, DomainError> {
        let signal = ProductSignal::from_value(product_data.clone())?;
        Ok(self.score_signal(&signal, signal.niche()))
    }

    fn explain_score(&self, result: &ScoreResult) -> ScoreExplanation {
        generate_score_explanation(
            result.overall_score,
            &result.strengths,
            &result.weaknesses,
            result.confidence,
            &self.config.thresholds,
        )
    }

    fn default_config() -> ScorerConfig {
        default_scorer_config()
    }

    fn config(&self) -> &ScorerConfig {
        &self.config
    }
}

/// Successful results ordered by overall score (ties by product id), best first.
pub fn rank_scored_products(entries: &[BatchEntry], top_n: Option<usize>) -> Vec<ScoreResult> {
    let mut ranked: Vec<ScoreResult> =
        entries.iter().filter_map(BatchEntry::as_scored).cloned().collect();
    ranked.sort_by(|a, b| {
        b.overall_score
            .total_cmp(&a.overall_score)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    if let Some(limit) = top_n {
        ranked.truncate(limit);
    }
    ranked
}
