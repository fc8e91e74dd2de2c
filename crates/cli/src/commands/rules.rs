use std::path::Path;

use merchscope_core::config::LoadOptions;
use merchscope_core::recommend::{AssociationRule, AssociationRulesMiner, MinerThresholds};
use merchscope_core::{ApplicationError, ProductId};
use serde::Serialize;

use crate::commands::{load_config, read_transactions, CommandResult};

#[derive(Debug, Serialize)]
struct RulesReport {
    transactions: usize,
    thresholds: MinerThresholds,
    frequent_itemsets: usize,
    rule_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<String>,
    rules: Vec<AssociationRule>,
}

pub fn run(options: LoadOptions, orders: &Path, product: Option<&str>) -> CommandResult {
    CommandResult::from_outcome("rules", execute(options, orders, product))
}

fn execute(
    options: LoadOptions,
    orders: &Path,
    product: Option<&str>,
) -> Result<RulesReport, ApplicationError> {
    let config = load_config(options)?;
    let transactions = read_transactions(orders)?;

    let mut miner = AssociationRulesMiner::new(config.miner_thresholds())?;
    miner.fit(&transactions)?;

    let rules: Vec<AssociationRule> = match product {
        Some(product) => {
            miner.rules_for_product(&ProductId::from(product)).into_iter().cloned().collect()
        }
        None => miner.rules().to_vec(),
    };

    Ok(RulesReport {
        transactions: miner.transaction_count(),
        thresholds: *miner.thresholds(),
        frequent_itemsets: miner.frequent_itemsets().len(),
        rule_count: rules.len(),
        product: product.map(str::to_owned),
        rules,
    })
}
