//! Static niche weighting catalog

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::Category;

/// Alternate weighting profile selected by niche substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheProfile {
    /// Lower-case key matched against the requested niche.
    pub key: String,
    /// Category weights replacing the defaults for the categories listed.
    #[serde(default)]
    pub category_weights: BTreeMap<Category, f64>,
    /// Multipliers applied to individual criterion weights.
    #[serde(default)]
    pub criterion_adjustments: BTreeMap<String, f64>,
}

impl NicheProfile {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            category_weights: BTreeMap::new(),
            criterion_adjustments: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, category: Category, weight: f64) -> Self {
        self.category_weights.insert(category, weight);
        self
    }

    pub fn with_adjustment(mut self, criterion: impl Into<String>, factor: f64) -> Self {
        self.criterion_adjustments.insert(criterion.into(), factor);
        self
    }

    /// Substring match in either direction on the normalized niche name.
    pub fn matches(&self, niche: &str) -> bool {
        let niche = normalize_niche(niche);
        if niche.is_empty() || self.key.is_empty() {
            return false;
        }
        niche.contains(&self.key) || self.key.contains(&niche)
    }
}

pub fn normalize_niche(niche: &str) -> String {
    niche
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' ', '/'], "_")
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn default_niche_table() -> Vec<NicheProfile> {
    use Category::*;

    vec![
        NicheProfile::new("fashion")
            .with_weight(MarketPotential, 0.20)
            .with_weight(Competition, 0.20)
            .with_weight(Profitability, 0.20)
            .with_weight(Operational, 0.15)
            .with_weight(Trend, 0.25)
            .with_adjustment("trend_momentum", 1.5)
            .with_adjustment("seasonality", 1.5)
            .with_adjustment("return_rate", 1.4),
        NicheProfile::new("electronics")
            .with_weight(MarketPotential, 0.25)
            .with_weight(Competition, 0.25)
            .with_weight(Profitability, 0.25)
            .with_weight(Operational, 0.15)
            .with_weight(Trend, 0.10)
            .with_adjustment("competitor_count", 1.3)
            .with_adjustment("price_stability", 1.4)
            .with_adjustment("return_rate", 1.2),
        NicheProfile::new("home_decor")
            .with_weight(MarketPotential, 0.25)
            .with_weight(Competition, 0.15)
            .with_weight(Profitability, 0.25)
            .with_weight(Operational, 0.20)
            .with_weight(Trend, 0.15)
            .with_adjustment("shipping_complexity", 1.5)
            .with_adjustment("price_point", 1.2),
        NicheProfile::new("beauty")
            .with_weight(MarketPotential, 0.20)
            .with_weight(Competition, 0.20)
            .with_weight(Profitability, 0.30)
            .with_weight(Operational, 0.10)
            .with_weight(Trend, 0.20)
            .with_adjustment("profit_margin", 1.3)
            .with_adjustment("audience_reach", 1.5)
            .with_adjustment("barriers_to_entry", 1.2),
        NicheProfile::new("fitness")
            .with_weight(MarketPotential, 0.25)
            .with_weight(Competition, 0.20)
            .with_weight(Profitability, 0.20)
            .with_weight(Operational, 0.15)
            .with_weight(Trend, 0.20)
            .with_adjustment("seasonality", 1.4)
            .with_adjustment("shipping_complexity", 1.3),
        NicheProfile::new("pet")
            .with_weight(MarketPotential, 0.30)
            .with_weight(Competition, 0.20)
            .with_weight(Profitability, 0.20)
            .with_weight(Operational, 0.15)
            .with_weight(Trend, 0.15)
            .with_adjustment("market_growth", 1.3)
            .with_adjustment("supplier_reliability", 1.2),
        NicheProfile::new("toys")
            .with_weight(MarketPotential, 0.20)
            .with_weight(Competition, 0.20)
            .with_weight(Profitability, 0.20)
            .with_weight(Operational, 0.15)
            .with_weight(Trend, 0.25)
            .with_adjustment("seasonality", 1.6)
            .with_adjustment("supplier_reliability", 1.3),
        NicheProfile::new("jewelry")
            .with_weight(MarketPotential, 0.20)
            .with_weight(Competition, 0.20)
            .with_weight(Profitability, 0.35)
            .with_weight(Operational, 0.10)
            .with_weight(Trend, 0.15)
            .with_adjustment("profit_margin", 1.4)
            .with_adjustment("shipping_complexity", 0.6),
    ]
}
