use std::path::Path;

use merchscope_core::config::LoadOptions;
use merchscope_core::domain::signal::identity_of;
use merchscope_core::scoring::{
    rank_scored_products, AdvancedProductScorer, BatchEntry, ErrorRecord, ProductScorer,
    ScoreResult,
};
use merchscope_core::ApplicationError;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::commands::{load_config, read_json, CommandResult};

#[derive(Debug, Serialize)]
struct ScoreReport {
    scored: usize,
    failed: usize,
    results: Vec<BatchEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranking: Option<Vec<RankedProduct>>,
}

#[derive(Debug, Serialize)]
struct RankedProduct {
    rank: usize,
    product_id: Option<String>,
    overall_score: f64,
    recommendation: &'static str,
}

pub fn run(
    options: LoadOptions,
    signals: &Path,
    niche: Option<&str>,
    top: Option<usize>,
) -> CommandResult {
    CommandResult::from_outcome("score", execute(options, signals, niche, top))
}

fn execute(
    options: LoadOptions,
    signals: &Path,
    niche: Option<&str>,
    top: Option<usize>,
) -> Result<ScoreReport, ApplicationError> {
    let config = load_config(options)?;
    let scorer = AdvancedProductScorer::with_config(config.scorer_config());

    // A single signal object is scored as a batch of one.
    let products = match read_json(signals)? {
        Value::Array(products) => products,
        single => vec![single],
    };

    let results: Vec<BatchEntry> = match niche {
        Some(niche) => products
            .iter()
            .map(|product| match scorer.score_product_for_niche(product, Some(niche)) {
                Ok(result) => BatchEntry::Scored(Box::new(result)),
                Err(error) => failed_entry(product, &error.to_string()),
            })
            .collect(),
        None => scorer.batch_score_products(&products),
    };

    let failed = results.iter().filter(|entry| entry.is_failed()).count();
    info!(
        event_name = "cli.score.completed",
        products = results.len(),
        failed,
        "scoring batch completed"
    );

    let ranking = top.map(|limit| {
        rank_scored_products(&results, Some(limit))
            .iter()
            .enumerate()
            .map(|(index, result)| ranked(index + 1, result))
            .collect()
    });

    Ok(ScoreReport { scored: results.len() - failed, failed, results, ranking })
}

fn failed_entry(product: &Value, error: &str) -> BatchEntry {
    let (product_id, product_name) = identity_of(product);
    BatchEntry::Failed(ErrorRecord {
        error: error.to_string(),
        product_id,
        product_name,
    })
}

fn ranked(rank: usize, result: &ScoreResult) -> RankedProduct {
    RankedProduct {
        rank,
        product_id: result.product_id.clone(),
        overall_score: result.overall_score,
        recommendation: result.recommendation.as_str(),
    }
}
