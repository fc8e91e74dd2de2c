//! Multicriteria scoring core
//!
//! Stateless helpers shared by every scorer: category aggregation, niche
//! reweighting, confidence, strengths/weaknesses and explanations.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::domain::signal::{ProductSignal, DATA_SOURCES};

use super::criteria::{self, CriterionRegistry};
use super::niche::NicheProfile;
use super::types::*;
use super::{NEUTRAL_SCORE, STRENGTH_THRESHOLD, WEAKNESS_THRESHOLD};

/// Spread of category scores at which consistency reaches zero.
const CONSISTENCY_SPREAD: f64 = 40.0;

pub fn default_scorer_config() -> ScorerConfig {
    use Category::*;

    let weights = BTreeMap::from([
        (MarketPotential, 0.25),
        (Competition, 0.20),
        (Profitability, 0.25),
        (Operational, 0.15),
        (Trend, 0.15),
    ]);

    let criteria = BTreeMap::from([
        (
            MarketPotential,
            vec![
                Criterion::new("search_volume", 0.35),
                Criterion::new("market_size", 0.25),
                Criterion::new("market_growth", 0.25),
                Criterion::new("audience_reach", 0.15),
            ],
        ),
        (
            Competition,
            vec![
                Criterion::new("competitor_count", 0.45),
                Criterion::new("market_saturation", 0.35),
                Criterion::new("barriers_to_entry", 0.20),
            ],
        ),
        (
            Profitability,
            vec![
                Criterion::new("profit_margin", 0.50),
                Criterion::new("price_point", 0.25),
                Criterion::new("price_stability", 0.25),
            ],
        ),
        (
            Operational,
            vec![
                Criterion::new("shipping_complexity", 0.35),
                Criterion::new("return_rate", 0.35),
                Criterion::new("supplier_reliability", 0.30),
            ],
        ),
        (
            Trend,
            vec![
                Criterion::new("trend_growth", 0.45),
                Criterion::new("trend_stability", 0.30),
                Criterion::new("trend_momentum", 0.15),
                Criterion::new("seasonality", 0.10),
            ],
        ),
    ]);

    ScorerConfig {
        weights,
        criteria,
        niche_adjustments: true,
        thresholds: RecommendationThresholds::default(),
        critical_criteria: vec![
            "profit_margin".to_owned(),
            "competitor_count".to_owned(),
            "search_volume".to_owned(),
            "trend_growth".to_owned(),
        ],
    }
}

/// Rescales criterion weights to sum to 1.0. All-zero weights are left alone.
pub fn normalize_weights(criteria: &mut [Criterion]) {
    let total: f64 = criteria.iter().map(|criterion| criterion.weight).sum();
    if total > 0.0 {
        for criterion in criteria.iter_mut() {
            criterion.weight /= total;
        }
    }
}

fn normalize_category_weights(weights: &mut BTreeMap<Category, f64>) {
    let total: f64 = weights.values().sum();
    if total > 0.0 {
        for weight in weights.values_mut() {
            *weight /= total;
        }
    }
}

/// Rescales category weights and each category's criterion weights to sum to 1.
/// Groups whose weights are all zero are left as they are.
pub fn normalize_config(config: &mut ScorerConfig) {
    normalize_category_weights(&mut config.weights);
    for criteria in config.criteria.values_mut() {
        normalize_weights(criteria);
    }
}

/// First profile in table order whose key matches `niche`.
pub fn find_niche_profile<'a>(
    niche: &str,
    niche_table: &'a [NicheProfile],
) -> Option<&'a NicheProfile> {
    niche_table.iter().find(|profile| profile.matches(niche))
}

/// Returns a fresh copy of `config` with the first matching niche profile
/// applied. Unknown niches yield an unmodified copy.
pub fn apply_niche_optimizations(
    config: &ScorerConfig,
    niche: &str,
    niche_table: &[NicheProfile],
) -> ScorerConfig {
    let mut adjusted = config.clone();
    let Some(profile) = find_niche_profile(niche, niche_table) else {
        return adjusted;
    };

    for (category, weight) in &profile.category_weights {
        adjusted.weights.insert(*category, weight.max(0.0));
    }
    normalize_category_weights(&mut adjusted.weights);

    for criteria in adjusted.criteria.values_mut() {
        let mut touched = false;
        for criterion in criteria.iter_mut() {
            if let Some(factor) = profile.criterion_adjustments.get(&criterion.name) {
                criterion.weight *= factor.max(0.0);
                touched = true;
            }
        }
        if touched {
            normalize_weights(criteria);
        }
    }

    adjusted
}

/// Weighted average over the criteria that produced a score, renormalized by
/// the weight actually available. Neutral when nothing is available.
pub fn calculate_category_score(
    category: Category,
    criteria: &[Criterion],
    data: &ProductSignal,
    criterion_functions: &CriterionRegistry,
) -> f64 {
    let mut weighted = 0.0;
    let mut available_weight = 0.0;

    for criterion in criteria {
        if criterion.weight <= 0.0 {
            continue;
        }
        if let Some(score) = criteria::evaluate(criterion_functions, &criterion.name, data) {
            weighted += score * criterion.weight;
            available_weight += criterion.weight;
        }
    }

    if available_weight <= 0.0 {
        trace!(event_name = "scoring.category.neutral", category = category.as_str());
        return NEUTRAL_SCORE;
    }

    criteria::clamp_score(weighted / available_weight)
}

/// Weighted average of category scores, normalized by the total weight.
pub fn calculate_overall_score(
    category_scores: &BTreeMap<Category, f64>,
    weights: &BTreeMap<Category, f64>,
) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (category, score) in category_scores {
        let weight = weights.get(category).copied().unwrap_or(0.0);
        weighted += score * weight;
        total += weight;
    }

    if total <= 0.0 {
        NEUTRAL_SCORE
    } else {
        criteria::clamp_score(weighted / total)
    }
}

/// `0.6 * completeness + 0.4 * consistency`.
///
/// Completeness blends the share of healthy data sources (30%) with the share
/// of critical criteria that could be evaluated (70%). Consistency falls as the
/// category scores spread apart.
pub fn calculate_confidence(
    data: &ProductSignal,
    category_scores: &BTreeMap<Category, f64>,
    critical_criteria: &[String],
    criterion_functions: &CriterionRegistry,
) -> f64 {
    let source_share = DATA_SOURCES.iter().filter(|source| data.has_source(source)).count() as f64
        / DATA_SOURCES.len() as f64;

    let completeness = if critical_criteria.is_empty() {
        source_share * 100.0
    } else {
        let available = critical_criteria
            .iter()
            .filter(|name| criteria::evaluate(criterion_functions, name, data).is_some())
            .count() as f64;
        let critical_share = available / critical_criteria.len() as f64;
        (0.3 * source_share + 0.7 * critical_share) * 100.0
    };

    let scores: Vec<f64> = category_scores.values().copied().collect();
    let consistency = (100.0 - (population_stdev(&scores) / CONSISTENCY_SPREAD) * 100.0).max(0.0);

    criteria::clamp_score(0.6 * completeness + 0.4 * consistency)
}

fn population_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Categories scoring >= 70 are strengths (best first); <= 40 are weaknesses
/// (worst first). Categories with zero weight are ignored.
pub fn identify_strengths_weaknesses(
    category_scores: &BTreeMap<Category, f64>,
    config: &ScorerConfig,
) -> (Vec<ScoreFactor>, Vec<ScoreFactor>) {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    for (category, score) in category_scores {
        let weight = config.weights.get(category).copied().unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        if *score >= STRENGTH_THRESHOLD {
            strengths.push(ScoreFactor {
                category: *category,
                display_name: category.display_name().to_owned(),
                score: *score,
                description: category.strength_description().to_owned(),
            });
        } else if *score <= WEAKNESS_THRESHOLD {
            weaknesses.push(ScoreFactor {
                category: *category,
                display_name: category.display_name().to_owned(),
                score: *score,
                description: category.weakness_description().to_owned(),
            });
        }
    }

    strengths.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.category.cmp(&b.category)));
    weaknesses.sort_by(|a, b| {
        a.score.total_cmp(&b.score).then_with(|| a.category.cmp(&b.category))
    });

    (strengths, weaknesses)
}

pub fn get_recommendation(score: f64, thresholds: &RecommendationThresholds) -> Recommendation {
    if score >= thresholds.high_potential {
        Recommendation::HighPotential
    } else if score >= thresholds.medium_potential {
        Recommendation::MediumPotential
    } else if score >= thresholds.low_potential {
        Recommendation::LowPotential
    } else {
        Recommendation::NotRecommended
    }
}

/// Three-part explanation driven only by scores, confidence and category names.
pub fn generate_score_explanation(
    overall_score: f64,
    strengths: &[ScoreFactor],
    weaknesses: &[ScoreFactor],
    confidence: f64,
    thresholds: &RecommendationThresholds,
) -> ScoreExplanation {
    let summary = match get_recommendation(overall_score, thresholds) {
        Recommendation::HighPotential => format!(
            "Strong opportunity: an overall score of {overall_score:.1}/100 places this product in the high-potential tier."
        ),
        Recommendation::MediumPotential => format!(
            "Promising opportunity: an overall score of {overall_score:.1}/100 with room to improve weaker areas."
        ),
        Recommendation::LowPotential => format!(
            "Marginal opportunity: an overall score of {overall_score:.1}/100; proceed only with a clear edge."
        ),
        Recommendation::NotRecommended => format!(
            "Weak opportunity: an overall score of {overall_score:.1}/100 is not recommended under current conditions."
        ),
    };

    let mut key_factors: Vec<String> = strengths
        .iter()
        .take(3)
        .map(|factor| {
            format!(
                "{} is a strength ({:.1}/100): {}",
                factor.display_name, factor.score, factor.description
            )
        })
        .collect();
    key_factors.extend(weaknesses.iter().take(3).map(|factor| {
        format!(
            "{} is a weakness ({:.1}/100): {}",
            factor.display_name, factor.score, factor.description
        )
    }));
    if key_factors.is_empty() {
        key_factors.push("No category stands out; scores sit close to neutral.".to_owned());
    }

    let confidence_statement = if confidence >= 80.0 {
        format!(
            "High confidence ({confidence:.0}%): the score is backed by broad, consistent data."
        )
    } else if confidence >= 60.0 {
        format!(
            "Moderate confidence ({confidence:.0}%): most key data is present but some signals are missing or disagree."
        )
    } else if confidence >= 40.0 {
        format!(
            "Limited confidence ({confidence:.0}%): several key data points are missing; treat the score as indicative."
        )
    } else {
        format!(
            "Low confidence ({confidence:.0}%): the score rests on sparse data and should be verified."
        )
    };

    ScoreExplanation { summary, key_factors, confidence_statement }
}

/// Recursively merges `patch` into `target`. Objects merge key by key; any
/// other value (including arrays) replaces the target wholesale.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
