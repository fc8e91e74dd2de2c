use std::path::Path;

use merchscope_core::config::LoadOptions;
use merchscope_core::recommend::{ComplementaryProduct, UpsellProduct};
use merchscope_core::{ApplicationError, ProductId};
use serde::Serialize;

use crate::commands::{build_analyzer, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct RecommendReport {
    product_id: ProductId,
    complementary: Vec<ComplementaryProduct>,
    upsells: Vec<UpsellProduct>,
}

pub fn run(options: LoadOptions, orders: &Path, catalog: &Path, product_id: &str) -> CommandResult {
    CommandResult::from_outcome("recommend", execute(options, orders, catalog, product_id))
}

fn execute(
    options: LoadOptions,
    orders: &Path,
    catalog: &Path,
    product_id: &str,
) -> Result<RecommendReport, ApplicationError> {
    let config = load_config(options)?;
    let analyzer = build_analyzer(&config, orders, catalog)?;
    let product_id = ProductId::from(product_id);

    Ok(RecommendReport {
        complementary: analyzer.get_complementary_products(&product_id, None)?,
        upsells: analyzer.get_upsell_products(&product_id, None)?,
        product_id,
    })
}
