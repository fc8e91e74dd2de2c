use std::path::Path;

use merchscope_core::config::LoadOptions;
use merchscope_core::recommend::Bundle;
use merchscope_core::{ApplicationError, ProductId};
use serde::Serialize;

use crate::commands::{build_analyzer, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct BundleReport {
    product_ids: Vec<ProductId>,
    bundles: Vec<Bundle>,
}

pub fn run(
    options: LoadOptions,
    orders: &Path,
    catalog: &Path,
    product_ids: &[String],
) -> CommandResult {
    CommandResult::from_outcome("bundle", execute(options, orders, catalog, product_ids))
}

fn execute(
    options: LoadOptions,
    orders: &Path,
    catalog: &Path,
    product_ids: &[String],
) -> Result<BundleReport, ApplicationError> {
    let config = load_config(options)?;
    let analyzer = build_analyzer(&config, orders, catalog)?;
    let product_ids: Vec<ProductId> = product_ids.iter().map(ProductId::new).collect();

    let bundles = analyzer.bundle_products(&product_ids)?;
    Ok(BundleReport { product_ids, bundles })
}
