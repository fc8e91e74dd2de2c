use std::path::Path;

use merchscope_core::config::LoadOptions;
use merchscope_core::recommend::CartAnalysis;
use merchscope_core::{ApplicationError, ProductId};
use serde::Serialize;

use crate::commands::{build_analyzer, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct CartReport {
    product_ids: Vec<ProductId>,
    analysis: CartAnalysis,
}

pub fn run(
    options: LoadOptions,
    orders: &Path,
    catalog: &Path,
    product_ids: &[String],
) -> CommandResult {
    CommandResult::from_outcome("cart", execute(options, orders, catalog, product_ids))
}

fn execute(
    options: LoadOptions,
    orders: &Path,
    catalog: &Path,
    product_ids: &[String],
) -> Result<CartReport, ApplicationError> {
    let config = load_config(options)?;
    let analyzer = build_analyzer(&config, orders, catalog)?;
    let product_ids: Vec<ProductId> = product_ids.iter().map(ProductId::new).collect();

    let analysis = analyzer.analyze_cart(&product_ids)?;
    Ok(CartReport { product_ids, analysis })
}
