use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use merchscope_core::config::{resolve_config_path, AppConfig, LoadOptions};
use merchscope_core::recommend::MAX_ITEMSET_SIZE;
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    config_file: Option<String>,
    values: Vec<ConfigLine>,
}

#[derive(Debug, Serialize)]
struct ConfigLine {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match load_config(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("config", &error),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let attribution =
        Attribution { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    CommandResult::report(
        "config",
        ConfigReport {
            precedence: "env > file > default",
            config_file: config_file_path.as_ref().map(|path| path.display().to_string()),
            values: effective_values(&config, &attribution),
        },
    )
}

struct Attribution<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

fn effective_values(config: &AppConfig, attribution: &Attribution<'_>) -> Vec<ConfigLine> {
    let scoring = &config.scoring;
    let mining = &config.mining;
    let recommendations = &config.recommendations;

    let line = |key: &'static str, value: String, env_keys: &[&str]| ConfigLine {
        key,
        value,
        source: field_source(key, env_keys, attribution),
    };

    vec![
        line(
            "scoring.niche_adjustments",
            scoring.niche_adjustments.to_string(),
            &["MERCHSCOPE_SCORING_NICHE_ADJUSTMENTS"],
        ),
        line(
            "scoring.high_potential",
            scoring.high_potential.to_string(),
            &["MERCHSCOPE_SCORING_HIGH_POTENTIAL"],
        ),
        line(
            "scoring.medium_potential",
            scoring.medium_potential.to_string(),
            &["MERCHSCOPE_SCORING_MEDIUM_POTENTIAL"],
        ),
        line(
            "scoring.low_potential",
            scoring.low_potential.to_string(),
            &["MERCHSCOPE_SCORING_LOW_POTENTIAL"],
        ),
        line(
            "mining.min_support",
            mining.min_support.to_string(),
            &["MERCHSCOPE_MINING_MIN_SUPPORT"],
        ),
        line(
            "mining.min_confidence",
            mining.min_confidence.to_string(),
            &["MERCHSCOPE_MINING_MIN_CONFIDENCE"],
        ),
        line("mining.min_lift", mining.min_lift.to_string(), &["MERCHSCOPE_MINING_MIN_LIFT"]),
        line(
            "mining.max_itemset_size",
            mining
                .max_itemset_size
                .map_or_else(|| MAX_ITEMSET_SIZE.to_string(), |size| size.to_string()),
            &["MERCHSCOPE_MINING_MAX_ITEMSET_SIZE"],
        ),
        line(
            "recommendations.max_complementary",
            recommendations.max_complementary.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_MAX_COMPLEMENTARY"],
        ),
        line(
            "recommendations.max_upsells",
            recommendations.max_upsells.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_MAX_UPSELLS"],
        ),
        line(
            "recommendations.bundle_candidates",
            recommendations.bundle_candidates.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_BUNDLE_CANDIDATES"],
        ),
        line(
            "recommendations.base_bundle_discount",
            recommendations.base_bundle_discount.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_BASE_BUNDLE_DISCOUNT"],
        ),
        line(
            "recommendations.per_item_bundle_discount",
            recommendations.per_item_bundle_discount.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_PER_ITEM_BUNDLE_DISCOUNT"],
        ),
        line(
            "recommendations.max_bundle_discount",
            recommendations.max_bundle_discount.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_MAX_BUNDLE_DISCOUNT"],
        ),
        line(
            "recommendations.max_cart_suggestions",
            recommendations.max_cart_suggestions.to_string(),
            &["MERCHSCOPE_RECOMMENDATIONS_MAX_CART_SUGGESTIONS"],
        ),
        line(
            "logging.level",
            config.logging.level.clone(),
            &["MERCHSCOPE_LOGGING_LEVEL", "MERCHSCOPE_LOG_LEVEL"],
        ),
        line(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["MERCHSCOPE_LOGGING_FORMAT", "MERCHSCOPE_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], attribution: &Attribution<'_>) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = attribution.doc {
        if contains_path(doc, key_path) {
            let file_path = attribution
                .path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
