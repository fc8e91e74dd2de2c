//! Multi-criteria product scoring
//!
//! Criterion functions feed weighted category scores, which combine into an
//! overall score with a recommendation label, confidence and explanation.

pub mod criteria;
mod multicriteria;
mod niche;
mod scorer;
mod types;

pub use multicriteria::{
    apply_niche_optimizations, calculate_category_score, calculate_confidence,
    calculate_overall_score, deep_merge, default_scorer_config, find_niche_profile,
    generate_score_explanation, get_recommendation, identify_strengths_weaknesses,
    normalize_config, normalize_weights,
};
pub use niche::{default_niche_table, normalize_niche, NicheProfile};
pub use scorer::{rank_scored_products, AdvancedProductScorer, ProductScorer};
pub use types::*;

/// Category score used when no criterion in the category has data
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Category scores at or above this are reported as strengths
pub const STRENGTH_THRESHOLD: f64 = 70.0;

/// Category scores at or below this are reported as weaknesses
pub const WEAKNESS_THRESHOLD: f64 = 40.0;
