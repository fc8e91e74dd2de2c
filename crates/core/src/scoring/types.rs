//! Types for the product scoring engine

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Evaluation category; each groups a weighted set of criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MarketPotential,
    Competition,
    Profitability,
    Operational,
    Trend,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::MarketPotential,
        Category::Competition,
        Category::Profitability,
        Category::Operational,
        Category::Trend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MarketPotential => "market_potential",
            Category::Competition => "competition",
            Category::Profitability => "profitability",
            Category::Operational => "operational",
            Category::Trend => "trend",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::MarketPotential => "Market Potential",
            Category::Competition => "Competition",
            Category::Profitability => "Profitability",
            Category::Operational => "Operational Feasibility",
            Category::Trend => "Trend Strength",
        }
    }

    /// Sentence used when the category stands out as a strength.
    pub fn strength_description(&self) -> &'static str {
        match self {
            Category::MarketPotential => "Solid demand and room for the market to grow",
            Category::Competition => "Competitive pressure is manageable",
            Category::Profitability => "Healthy margins at a workable price point",
            Category::Operational => "Straightforward to source, ship and support",
            Category::Trend => "Interest is growing at a steady pace",
        }
    }

    /// Sentence used when the category drags the score down.
    pub fn weakness_description(&self) -> &'static str {
        match self {
            Category::MarketPotential => "Limited demand or a shrinking market",
            Category::Competition => "Crowded market with strong incumbents",
            Category::Profitability => "Thin or unstable margins",
            Category::Operational => "Costly logistics, returns or unreliable supply",
            Category::Trend => "Weak, volatile or declining interest",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, weighted evaluation function within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub weight: f64,
}

impl Criterion {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self { name: name.into(), weight }
    }
}

/// Score boundaries for the recommendation label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    pub high_potential: f64,
    pub medium_potential: f64,
    pub low_potential: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self { high_potential: 75.0, medium_potential: 60.0, low_potential: 40.0 }
    }
}

/// Live scorer configuration. Owned by exactly one scorer instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub weights: BTreeMap<Category, f64>,
    pub criteria: BTreeMap<Category, Vec<Criterion>>,
    pub niche_adjustments: bool,
    #[serde(default)]
    pub thresholds: RecommendationThresholds,
    /// Criteria whose availability drives the completeness part of confidence.
    #[serde(default)]
    pub critical_criteria: Vec<String>,
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut total = 0.0;
        for (category, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(DomainError::InvalidConfig(format!(
                    "weight for category `{category}` must be a non-negative number"
                )));
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(DomainError::InvalidConfig(
                "category weights must not all be zero".to_owned(),
            ));
        }

        for (category, criteria) in &self.criteria {
            for criterion in criteria {
                if !criterion.weight.is_finite() || criterion.weight < 0.0 {
                    return Err(DomainError::InvalidConfig(format!(
                        "criterion `{}` in `{category}` must have a non-negative weight",
                        criterion.name
                    )));
                }
                if super::criteria::lookup(&criterion.name).is_none() {
                    return Err(DomainError::InvalidConfig(format!(
                        "unknown criterion `{}` in `{category}`",
                        criterion.name
                    )));
                }
            }
        }

        let thresholds = &self.thresholds;
        let ordered = thresholds.high_potential > thresholds.medium_potential
            && thresholds.medium_potential > thresholds.low_potential
            && thresholds.low_potential >= 0.0
            && thresholds.high_potential <= 100.0;
        if !ordered {
            return Err(DomainError::InvalidConfig(
                "thresholds must satisfy 0 <= low < medium < high <= 100".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Four-tier recommendation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HighPotential,
    MediumPotential,
    LowPotential,
    NotRecommended,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::HighPotential => "high_potential",
            Recommendation::MediumPotential => "medium_potential",
            Recommendation::LowPotential => "low_potential",
            Recommendation::NotRecommended => "not_recommended",
        }
    }
}

/// A category that stands out in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub category: Category,
    pub display_name: String,
    pub score: f64,
    pub description: String,
}

/// Human-readable explanation of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    pub summary: String,
    pub key_factors: Vec<String>,
    pub confidence_statement: String,
}

/// Full scoring output for a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Niche profile applied, if any matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    pub overall_score: f64,
    pub category_scores: BTreeMap<Category, f64>,
    /// Scores of the criteria that had data.
    #[serde(default)]
    pub criterion_scores: BTreeMap<String, f64>,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub strengths: Vec<ScoreFactor>,
    pub weaknesses: Vec<ScoreFactor>,
    pub explanation: ScoreExplanation,
}

/// Inline failure record for one product of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
}

/// One position of a batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Scored(Box<ScoreResult>),
    Failed(ErrorRecord),
}

impl BatchEntry {
    pub fn as_scored(&self) -> Option<&ScoreResult> {
        match self {
            BatchEntry::Scored(result) => Some(result),
            BatchEntry::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&ErrorRecord> {
        match self {
            BatchEntry::Scored(_) => None,
            BatchEntry::Failed(record) => Some(record),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchEntry::Failed(_))
    }
}
