use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ApplicationError;
use crate::recommend::{
    AnalyzerSettings, MinerThresholds, MAX_ITEMSET_SIZE, MIN_BUNDLE_DISCOUNT,
};
use crate::scoring::{default_scorer_config, RecommendationThresholds, ScorerConfig};

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["merchscope.toml", "config/merchscope.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub mining: MiningConfig,
    pub recommendations: RecommendationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoringConfig {
    pub niche_adjustments: bool,
    pub high_potential: f64,
    pub medium_potential: f64,
    pub low_potential: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiningConfig {
    pub min_support: f64,
    pub min_confidence: f64,
    pub min_lift: f64,
    pub max_itemset_size: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommendationsConfig {
    pub max_complementary: usize,
    pub max_upsells: usize,
    pub bundle_candidates: usize,
    pub base_bundle_discount: f64,
    pub per_item_bundle_discount: f64,
    pub max_bundle_discount: f64,
    pub max_cart_suggestions: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub niche_adjustments: Option<bool>,
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
    pub min_lift: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for ApplicationError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let thresholds = RecommendationThresholds::default();
        let mining = MinerThresholds::default();
        let recommendations = AnalyzerSettings::default();

        Self {
            scoring: ScoringConfig {
                niche_adjustments: true,
                high_potential: thresholds.high_potential,
                medium_potential: thresholds.medium_potential,
                low_potential: thresholds.low_potential,
            },
            mining: MiningConfig {
                min_support: mining.min_support,
                min_confidence: mining.min_confidence,
                min_lift: mining.min_lift,
                max_itemset_size: mining.max_itemset_size,
            },
            recommendations: RecommendationsConfig {
                max_complementary: recommendations.max_complementary,
                max_upsells: recommendations.max_upsells,
                bundle_candidates: recommendations.bundle_candidates,
                base_bundle_discount: recommendations.base_bundle_discount,
                per_item_bundle_discount: recommendations.per_item_bundle_discount,
                max_bundle_discount: recommendations.max_bundle_discount,
                max_cart_suggestions: recommendations.max_cart_suggestions,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Default scorer configuration with the loaded thresholds and niche switch.
    pub fn scorer_config(&self) -> ScorerConfig {
        let mut config = default_scorer_config();
        config.niche_adjustments = self.scoring.niche_adjustments;
        config.thresholds = RecommendationThresholds {
            high_potential: self.scoring.high_potential,
            medium_potential: self.scoring.medium_potential,
            low_potential: self.scoring.low_potential,
        };
        config
    }

    pub fn miner_thresholds(&self) -> MinerThresholds {
        MinerThresholds {
            min_support: self.mining.min_support,
            min_confidence: self.mining.min_confidence,
            min_lift: self.mining.min_lift,
            max_itemset_size: self.mining.max_itemset_size,
        }
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            max_complementary: self.recommendations.max_complementary,
            max_upsells: self.recommendations.max_upsells,
            bundle_candidates: self.recommendations.bundle_candidates,
            base_bundle_discount: self.recommendations.base_bundle_discount,
            per_item_bundle_discount: self.recommendations.per_item_bundle_discount,
            max_bundle_discount: self.recommendations.max_bundle_discount,
            max_cart_suggestions: self.recommendations.max_cart_suggestions,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(scoring) = patch.scoring {
            if let Some(niche_adjustments) = scoring.niche_adjustments {
                self.scoring.niche_adjustments = niche_adjustments;
            }
            if let Some(high_potential) = scoring.high_potential {
                self.scoring.high_potential = high_potential;
            }
            if let Some(medium_potential) = scoring.medium_potential {
                self.scoring.medium_potential = medium_potential;
            }
            if let Some(low_potential) = scoring.low_potential {
                self.scoring.low_potential = low_potential;
            }
        }

        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(min_confidence) = mining.min_confidence {
                self.mining.min_confidence = min_confidence;
            }
            if let Some(min_lift) = mining.min_lift {
                self.mining.min_lift = min_lift;
            }
            if let Some(max_itemset_size) = mining.max_itemset_size {
                self.mining.max_itemset_size = Some(max_itemset_size);
            }
        }

        if let Some(recommendations) = patch.recommendations {
            if let Some(value) = recommendations.max_complementary {
                self.recommendations.max_complementary = value;
            }
            if let Some(value) = recommendations.max_upsells {
                self.recommendations.max_upsells = value;
            }
            if let Some(value) = recommendations.bundle_candidates {
                self.recommendations.bundle_candidates = value;
            }
            if let Some(value) = recommendations.base_bundle_discount {
                self.recommendations.base_bundle_discount = value;
            }
            if let Some(value) = recommendations.per_item_bundle_discount {
                self.recommendations.per_item_bundle_discount = value;
            }
            if let Some(value) = recommendations.max_bundle_discount {
                self.recommendations.max_bundle_discount = value;
            }
            if let Some(value) = recommendations.max_cart_suggestions {
                self.recommendations.max_cart_suggestions = value;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MERCHSCOPE_SCORING_NICHE_ADJUSTMENTS") {
            self.scoring.niche_adjustments =
                parse_bool("MERCHSCOPE_SCORING_NICHE_ADJUSTMENTS", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_SCORING_HIGH_POTENTIAL") {
            self.scoring.high_potential = parse_f64("MERCHSCOPE_SCORING_HIGH_POTENTIAL", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_SCORING_MEDIUM_POTENTIAL") {
            self.scoring.medium_potential =
                parse_f64("MERCHSCOPE_SCORING_MEDIUM_POTENTIAL", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_SCORING_LOW_POTENTIAL") {
            self.scoring.low_potential = parse_f64("MERCHSCOPE_SCORING_LOW_POTENTIAL", &value)?;
        }

        if let Some(value) = read_env("MERCHSCOPE_MINING_MIN_SUPPORT") {
            self.mining.min_support = parse_f64("MERCHSCOPE_MINING_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_MINING_MIN_CONFIDENCE") {
            self.mining.min_confidence = parse_f64("MERCHSCOPE_MINING_MIN_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_MINING_MIN_LIFT") {
            self.mining.min_lift = parse_f64("MERCHSCOPE_MINING_MIN_LIFT", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_MINING_MAX_ITEMSET_SIZE") {
            self.mining.max_itemset_size =
                Some(parse_usize("MERCHSCOPE_MINING_MAX_ITEMSET_SIZE", &value)?);
        }

        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_MAX_COMPLEMENTARY") {
            self.recommendations.max_complementary =
                parse_usize("MERCHSCOPE_RECOMMENDATIONS_MAX_COMPLEMENTARY", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_MAX_UPSELLS") {
            self.recommendations.max_upsells =
                parse_usize("MERCHSCOPE_RECOMMENDATIONS_MAX_UPSELLS", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_BUNDLE_CANDIDATES") {
            self.recommendations.bundle_candidates =
                parse_usize("MERCHSCOPE_RECOMMENDATIONS_BUNDLE_CANDIDATES", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_BASE_BUNDLE_DISCOUNT") {
            self.recommendations.base_bundle_discount =
                parse_f64("MERCHSCOPE_RECOMMENDATIONS_BASE_BUNDLE_DISCOUNT", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_PER_ITEM_BUNDLE_DISCOUNT") {
            self.recommendations.per_item_bundle_discount =
                parse_f64("MERCHSCOPE_RECOMMENDATIONS_PER_ITEM_BUNDLE_DISCOUNT", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_MAX_BUNDLE_DISCOUNT") {
            self.recommendations.max_bundle_discount =
                parse_f64("MERCHSCOPE_RECOMMENDATIONS_MAX_BUNDLE_DISCOUNT", &value)?;
        }
        if let Some(value) = read_env("MERCHSCOPE_RECOMMENDATIONS_MAX_CART_SUGGESTIONS") {
            self.recommendations.max_cart_suggestions =
                parse_usize("MERCHSCOPE_RECOMMENDATIONS_MAX_CART_SUGGESTIONS", &value)?;
        }

        let log_level =
            read_env("MERCHSCOPE_LOGGING_LEVEL").or_else(|| read_env("MERCHSCOPE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MERCHSCOPE_LOGGING_FORMAT").or_else(|| read_env("MERCHSCOPE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(niche_adjustments) = overrides.niche_adjustments {
            self.scoring.niche_adjustments = niche_adjustments;
        }
        if let Some(min_support) = overrides.min_support {
            self.mining.min_support = min_support;
        }
        if let Some(min_confidence) = overrides.min_confidence {
            self.mining.min_confidence = min_confidence;
        }
        if let Some(min_lift) = overrides.min_lift {
            self.mining.min_lift = min_lift;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_scoring(&self.scoring)?;
        validate_mining(&self.mining)?;
        validate_recommendations(&self.recommendations)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path, else the default locations.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    let in_range = |value: f64| value.is_finite() && (0.0..=100.0).contains(&value);
    if !in_range(scoring.high_potential)
        || !in_range(scoring.medium_potential)
        || !in_range(scoring.low_potential)
    {
        return Err(ConfigError::Validation(
            "scoring thresholds must be in range 0..=100".to_string(),
        ));
    }

    if !(scoring.high_potential > scoring.medium_potential
        && scoring.medium_potential > scoring.low_potential)
    {
        return Err(ConfigError::Validation(
            "scoring thresholds must be ordered high_potential > medium_potential > low_potential"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_mining(mining: &MiningConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&mining.min_support) {
        return Err(ConfigError::Validation(
            "mining.min_support must be in range 0..=1".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&mining.min_confidence) {
        return Err(ConfigError::Validation(
            "mining.min_confidence must be in range 0..=1".to_string(),
        ));
    }

    if !mining.min_lift.is_finite() || mining.min_lift < 0.0 {
        return Err(ConfigError::Validation("mining.min_lift must be >= 0".to_string()));
    }

    if mining.max_itemset_size.is_some_and(|size| !(2..=MAX_ITEMSET_SIZE).contains(&size)) {
        return Err(ConfigError::Validation(format!(
            "mining.max_itemset_size must be in range 2..={MAX_ITEMSET_SIZE} (rules need two items)"
        )));
    }

    Ok(())
}

fn validate_recommendations(recommendations: &RecommendationsConfig) -> Result<(), ConfigError> {
    let percent = |value: f64| value.is_finite() && (0.0..100.0).contains(&value);

    if !percent(recommendations.base_bundle_discount)
        || recommendations.base_bundle_discount < MIN_BUNDLE_DISCOUNT
    {
        return Err(ConfigError::Validation(format!(
            "recommendations.base_bundle_discount must be at least {MIN_BUNDLE_DISCOUNT} and below 100"
        )));
    }

    if !percent(recommendations.per_item_bundle_discount) {
        return Err(ConfigError::Validation(
            "recommendations.per_item_bundle_discount must be in range 0..100".to_string(),
        ));
    }

    if !percent(recommendations.max_bundle_discount)
        || recommendations.max_bundle_discount < recommendations.base_bundle_discount
    {
        return Err(ConfigError::Validation(
            "recommendations.max_bundle_discount must be below 100 and at least base_bundle_discount"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    scoring: Option<ScoringPatch>,
    mining: Option<MiningPatch>,
    recommendations: Option<RecommendationsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    niche_adjustments: Option<bool>,
    high_potential: Option<f64>,
    medium_potential: Option<f64>,
    low_potential: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    min_support: Option<f64>,
    min_confidence: Option<f64>,
    min_lift: Option<f64>,
    max_itemset_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationsPatch {
    max_complementary: Option<usize>,
    max_upsells: Option<usize>,
    bundle_candidates: Option<usize>,
    base_bundle_discount: Option<f64>,
    per_item_bundle_discount: Option<f64>,
    max_bundle_discount: Option<f64>,
    max_cart_suggestions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
