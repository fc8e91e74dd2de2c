use merchscope_core::recommend::{
    transactions_from_json, AnalyzerSettings, AssociationRulesMiner, ComplementaryAnalyzer,
    MinerThresholds, Transaction, DEFAULT_MAX_ITEMSET_SIZE,
};
use merchscope_core::{DomainError, ProductId, ProductMetadata};
use rust_decimal::Decimal;
use serde_json::json;

fn orders() -> Vec<Transaction> {
    transactions_from_json(&json!([
        ["yoga-mat", "yoga-block", "strap"],
        ["yoga-mat", "yoga-block"],
        ["yoga-mat", "water-bottle"],
        ["yoga-mat", "strap"],
        ["dumbbells", "water-bottle"],
        ["dumbbells", "bench"],
        ["dumbbells", "bench", "water-bottle"],
        ["yoga-mat", "yoga-block", "water-bottle"],
        ["foam-roller"],
        ["yoga-mat", "foam-roller", "strap"]
    ]))
    .expect("well-formed transactions")
}

fn catalog() -> Vec<ProductMetadata> {
    serde_json::from_value(json!([
        {"id": "yoga-mat", "name": "Cork Yoga Mat", "category": "fitness", "price": "39.90", "rating": 4.6, "popularity": 82},
        {"id": "yoga-mat-pro", "name": "Pro Yoga Mat", "category": "fitness", "price": "54.00", "rating": 4.7, "popularity": 60},
        {"id": "yoga-mat-luxe", "name": "Luxe Yoga Mat", "category": "fitness", "price": "189.00", "rating": 4.9, "popularity": 30},
        {"id": "yoga-block", "name": "Foam Block", "category": "fitness_accessories", "price": "12.50", "rating": 4.3, "popularity": 70},
        {"id": "strap", "name": "Cotton Strap", "category": "fitness_accessories", "price": "8.00", "rating": 4.1, "popularity": 55},
        {"id": "water-bottle", "name": "Steel Bottle", "category": "sportswear", "price": "19.99", "rating": 4.5, "popularity": 90},
        {"id": "dumbbells", "name": "Hex Dumbbells", "category": "fitness", "price": "64.00", "rating": 4.4, "popularity": 65},
        {"id": "bench", "name": "Flat Bench", "category": "fitness", "price": "129.00", "rating": 4.2, "popularity": 40},
        {"id": "foam-roller", "name": "Foam Roller", "category": "recovery", "price": "24.00", "rating": 4.0, "popularity": 50}
    ]))
    .expect("well-formed catalog")
}

fn analyzer() -> ComplementaryAnalyzer {
    analyzer_over(catalog())
}

fn analyzer_over(products: Vec<ProductMetadata>) -> ComplementaryAnalyzer {
    let mut analyzer =
        ComplementaryAnalyzer::new(MinerThresholds::new(0.1, 0.2, 1.0), AnalyzerSettings::default())
            .expect("valid settings");
    analyzer.load_transactions(&orders()).expect("transactions load");
    analyzer.load_product_metadata(products).expect("catalog loads");
    analyzer
}

fn ids(values: &[&str]) -> Vec<ProductId> {
    values.iter().map(|id| ProductId::from(*id)).collect()
}

#[test]
fn stricter_thresholds_never_yield_more_rules() {
    let mut loose = AssociationRulesMiner::new(MinerThresholds::new(0.1, 0.2, 1.0)).expect("valid");
    let mut strict =
        AssociationRulesMiner::new(MinerThresholds::new(0.4, 0.6, 1.5)).expect("valid");

    let loose_count = loose.fit(&orders()).expect("fits");
    let strict_count = strict.fit(&orders()).expect("fits");

    assert!(loose_count > 0);
    assert!(loose_count >= strict_count);
    for rule in strict.rules() {
        assert!(loose.rules().contains(rule), "strict rule missing from loose set: {rule:?}");
    }
}

#[test]
fn non_array_transactions_are_rejected() {
    let error = transactions_from_json(&json!({"orders": 3})).expect_err("object must fail");
    assert!(matches!(error, DomainError::InvalidInput(_)));
}

#[test]
fn recommendations_never_include_the_seed() {
    let analyzer = analyzer();

    for product in catalog() {
        let complementary = analyzer
            .get_complementary_products(&product.id, Some(50))
            .expect("catalog loaded");
        assert!(complementary.iter().all(|entry| entry.product.id != product.id));

        let upsells = analyzer.get_upsell_products(&product.id, Some(50)).expect("catalog loaded");
        assert!(upsells.iter().all(|entry| entry.product.id != product.id));
        assert!(upsells.iter().all(|entry| entry.product.price > product.price));
    }
}

#[test]
fn rule_and_category_sources_both_contribute() {
    let analyzer = analyzer();
    let results = analyzer
        .get_complementary_products(&ProductId::from("yoga-mat"), None)
        .expect("catalog loaded");

    let ranked: Vec<&str> = results.iter().map(|entry| entry.product.id.as_str()).collect();
    assert!(ranked.contains(&"yoga-block"));
    assert!(ranked.contains(&"strap"));
    assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
    assert!(results.len() <= analyzer.settings().max_complementary);
}

#[test]
fn upsells_favour_moderate_premiums() {
    let analyzer = analyzer();
    let upsells = analyzer
        .get_upsell_products(&ProductId::from("yoga-mat"), None)
        .expect("catalog loaded");

    let position = |id: &str| upsells.iter().position(|entry| entry.product.id.as_str() == id);
    let pro = position("yoga-mat-pro").expect("pro mat is an upsell");
    let luxe = position("yoga-mat-luxe").expect("luxe mat is an upsell");
    assert!(pro < luxe);
}

#[test]
fn bundles_contain_every_seed_and_cost_less() {
    let analyzer = analyzer();
    let seeds = ids(&["yoga-mat", "yoga-block"]);
    let bundles = analyzer.bundle_products(&seeds).expect("catalog loaded");

    assert!(!bundles.is_empty());
    for bundle in &bundles {
        for seed in &seeds {
            assert!(bundle.product_ids.contains(seed));
        }
        assert!(bundle.bundle_price < bundle.original_price);
        assert_eq!(bundle.savings, bundle.original_price - bundle.bundle_price);
        assert!(bundle.bundle_price.scale() <= 2);
        assert!(bundle.discount_percentage <= Decimal::new(15, 0));
    }
}

#[test]
fn bundle_pricing_truncates_to_cents() {
    let analyzer = analyzer();
    let bundles = analyzer.bundle_products(&ids(&["yoga-mat", "strap"])).expect("catalog loaded");

    // 39.90 + 8.00 + 12.50 = 60.40 at 7.5% off is 55.87
    let with_block = bundles
        .iter()
        .find(|bundle| bundle.product_ids.contains(&ProductId::from("yoga-block")))
        .expect("block completes a bundle");
    assert_eq!(with_block.original_price, Decimal::new(6040, 2));
    assert_eq!(with_block.bundle_price, Decimal::new(5587, 2));
}

#[test]
fn cart_score_never_rises_as_items_are_added() {
    let analyzer = analyzer();
    let growing = [
        ids(&["yoga-mat"]),
        ids(&["yoga-mat", "yoga-block"]),
        ids(&["yoga-mat", "yoga-block", "strap"]),
        ids(&["yoga-mat", "yoga-block", "strap", "water-bottle"]),
    ];

    let scores: Vec<f64> = growing
        .iter()
        .map(|cart| analyzer.analyze_cart(cart).expect("catalog loaded").cart_score)
        .collect();

    assert!(scores.windows(2).all(|pair| pair[1] <= pair[0]), "scores rose: {scores:?}");
    assert!(scores.iter().all(|score| (0.0..=100.0).contains(score)));
}

#[test]
fn cart_analysis_totals_known_items() {
    let analyzer = analyzer();
    let analysis = analyzer
        .analyze_cart(&ids(&["yoga-mat", "strap", "mystery"]))
        .expect("catalog loaded");

    assert_eq!(analysis.cart_value, Decimal::new(4790, 2));
    assert_eq!(analysis.product_count, 3);
    assert!(analysis
        .missing_complementary
        .iter()
        .all(|entry| !["yoga-mat", "strap"].contains(&entry.product.id.as_str())));
    assert!(analysis.potential_upsells.len() <= analyzer.settings().max_cart_suggestions);
}

#[test]
fn queries_before_catalog_load_fail() {
    let analyzer = ComplementaryAnalyzer::default();
    let error = analyzer.bundle_products(&ids(&["yoga-mat"])).expect_err("no catalog");
    assert!(matches!(error, DomainError::NotConfigured(_)));
}

#[test]
fn items_without_complements_do_not_close_the_cart_gap() {
    let mut products = catalog();
    products.push(ProductMetadata::new(
        "gift-card",
        "Gift Card",
        "gift_cards",
        Decimal::new(2500, 2),
    ));
    let analyzer = analyzer_over(products);

    let gift_card = ProductId::from("gift-card");
    assert!(analyzer.get_complementary_products(&gift_card, None).expect("loaded").is_empty());

    let mat_only = analyzer.analyze_cart(&ids(&["yoga-mat"])).expect("catalog loaded");
    let with_card =
        analyzer.analyze_cart(&ids(&["yoga-mat", "gift-card"])).expect("catalog loaded");

    assert_eq!(with_card.cart_score, mat_only.cart_score);
    assert!(with_card.cart_score > 0.0);
    assert!(!with_card.missing_complementary.is_empty());
    assert_eq!(with_card.cart_value, Decimal::new(6490, 2));
}

#[test]
fn one_huge_order_is_mined_with_default_thresholds() {
    let mut transactions = orders();
    let wholesale: Transaction = (0..20)
        .map(|index| ProductId::from(format!("sku-{index:02}")))
        .chain(ids(&["yoga-mat", "strap"]))
        .collect();
    transactions.push(wholesale);

    let mut miner = AssociationRulesMiner::new(MinerThresholds::default()).expect("valid");
    miner.fit(&transactions).expect("fits");

    assert_eq!(miner.transaction_count(), 11);
    assert!(!miner.rules().is_empty());
    assert!(miner
        .frequent_itemsets()
        .iter()
        .all(|itemset| itemset.items.len() <= DEFAULT_MAX_ITEMSET_SIZE));

    let recommendations = miner.get_product_recommendations(&ids(&["sku-00"]), Some(3));
    assert_eq!(recommendations.len(), 3);
}
