//! Multi-criteria product scoring and complementary product recommendations.

pub mod config;
pub mod domain;
pub mod errors;
pub mod recommend;
pub mod scoring;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::product::{ProductId, ProductMetadata};
pub use domain::signal::ProductSignal;
pub use errors::{ApplicationError, DomainError};
pub use recommend::{
    AnalyzerSettings, AssociationRule, AssociationRulesMiner, Bundle, CartAnalysis,
    ComplementaryAnalyzer, ComplementaryProduct, MinerThresholds, RecommendationMetric,
    RecommendationSource, RuleRecommendation, Transaction, UpsellProduct,
};
pub use scoring::{
    rank_scored_products, AdvancedProductScorer, BatchEntry, Category, ProductScorer,
    Recommendation, ScoreResult, ScorerConfig,
};
