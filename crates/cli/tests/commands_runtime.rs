use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use merchscope_cli::commands::{bundle, cart, config, recommend, rules, score};
use merchscope_core::config::LoadOptions;
use serde_json::Value;
use tempfile::TempDir;

const ORDERS: &str = r#"[
  ["yoga-mat", "yoga-block", "strap"],
  ["yoga-mat", "yoga-block"],
  ["yoga-mat", "strap"],
  ["yoga-mat", "water-bottle"],
  ["dumbbells", "bench"],
  ["dumbbells", "bench", "water-bottle"]
]"#;

const CATALOG: &str = r#"[
  {"id": "yoga-mat", "name": "Cork Yoga Mat", "category": "fitness", "price": "39.90", "rating": 4.6, "popularity": 82},
  {"id": "yoga-mat-pro", "name": "Pro Yoga Mat", "category": "fitness", "price": "54.00", "rating": 4.7, "popularity": 60},
  {"id": "yoga-block", "name": "Foam Block", "category": "fitness_accessories", "price": "12.50", "rating": 4.3, "popularity": 70},
  {"id": "strap", "name": "Cotton Strap", "category": "fitness_accessories", "price": "8.00", "rating": 4.1, "popularity": 55},
  {"id": "water-bottle", "name": "Steel Bottle", "category": "sportswear", "price": "19.99", "rating": 4.5, "popularity": 90},
  {"id": "dumbbells", "name": "Hex Dumbbells", "category": "fitness", "price": "64.00", "rating": 4.4, "popularity": 65},
  {"id": "bench", "name": "Flat Bench", "category": "fitness", "price": "129.00", "rating": 4.2, "popularity": 40}
]"#;

const SIGNALS: &str = r#"[
  {"id": "mat", "marketplace": {"margin_percentage": 45, "competitor_count": 3},
   "trends": {"trend_metrics": {"x": {"growth_rate": 30, "volatility": 10}}}},
  {"id": "broken", "marketplace": "n/a"},
  {"id": "plain"}
]"#;

struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        for (name, contents) in
            [("orders.json", ORDERS), ("catalog.json", CATALOG), ("signals.json", SIGNALS)]
        {
            fs::write(dir.path().join(name), contents).expect("fixture should be written");
        }
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("fixture should be written");
        path
    }
}

#[test]
fn score_reports_results_and_inline_failures() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let result =
            score::run(LoadOptions::default(), &fixtures.path("signals.json"), None, Some(2));
        assert_eq!(result.exit_code, 0, "expected successful scoring run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "score");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["scored"], 2);
        assert_eq!(payload["failed"], 1);
        assert_eq!(payload["results"][0]["product_id"], "mat");
        assert!(payload["results"][1]["error"].is_string());
        assert_eq!(payload["ranking"][0]["product_id"], "mat");
        assert_eq!(payload["ranking"].as_array().map(Vec::len), Some(2));
    });
}

#[test]
fn score_accepts_a_single_signal_object() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let path = fixtures.write("single.json", r#"{"basic_info": {"id": "solo"}}"#);

        let result = score::run(LoadOptions::default(), &path, Some("fashion"), None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["results"][0]["product_id"], "solo");
        assert_eq!(payload["results"][0]["niche"], "fashion");
        assert!(payload.get("ranking").is_none());
    });
}

#[test]
fn score_reports_missing_input_file() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let result = score::run(LoadOptions::default(), &fixtures.path("absent.json"), None, None);
        assert_eq!(result.exit_code, 3, "expected input failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "io");
    });
}

#[test]
fn score_reports_unparseable_input() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let path = fixtures.write("garbled.json", "{not json");
        let result = score::run(LoadOptions::default(), &path, None, None);
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "parse");
    });
}

#[test]
fn rules_filter_by_product() {
    with_env(&[("MERCHSCOPE_MINING_MIN_SUPPORT", "0.2")], || {
        let fixtures = Fixtures::new();
        let result =
            rules::run(LoadOptions::default(), &fixtures.path("orders.json"), Some("bench"));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "rules");
        assert_eq!(payload["transactions"], 6);
        assert_eq!(payload["thresholds"]["min_support"], 0.2);

        let rules = payload["rules"].as_array().expect("rules array");
        assert!(!rules.is_empty());
        for rule in rules {
            let mentions_bench = [&rule["antecedent"], &rule["consequent"]]
                .iter()
                .filter_map(|side| side.as_array())
                .flatten()
                .any(|id| id == "bench");
            assert!(mentions_bench, "rule without bench: {rule}");
        }
    });
}

#[test]
fn rules_reject_non_array_transactions() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let path = fixtures.write("orders-object.json", r#"{"orders": []}"#);
        let result = rules::run(LoadOptions::default(), &path, None);
        assert_eq!(result.exit_code, 4, "expected domain failure code");
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_lists_complements_and_upsells() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let result = recommend::run(
            LoadOptions::default(),
            &fixtures.path("orders.json"),
            &fixtures.path("catalog.json"),
            "yoga-mat",
        );
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["product_id"], "yoga-mat");
        let complementary = payload["complementary"].as_array().expect("complementary array");
        assert!(complementary.iter().any(|entry| entry["product"]["id"] == "yoga-block"));
        assert!(complementary.iter().all(|entry| entry["product"]["id"] != "yoga-mat"));
        assert_eq!(payload["upsells"][0]["product"]["id"], "yoga-mat-pro");
    });
}

#[test]
fn bundle_prices_are_discounted() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let result = bundle::run(
            LoadOptions::default(),
            &fixtures.path("orders.json"),
            &fixtures.path("catalog.json"),
            &["yoga-mat".to_string()],
        );
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let bundles = payload["bundles"].as_array().expect("bundles array");
        assert!(!bundles.is_empty());
        for bundle in bundles {
            let original: f64 = decimal_field(&bundle["original_price"]);
            let discounted: f64 = decimal_field(&bundle["bundle_price"]);
            assert!(discounted < original);
            assert_eq!(bundle["product_ids"][0], "yoga-mat");
        }
    });
}

#[test]
fn cart_reports_value_and_gap() {
    with_env(&[], || {
        let fixtures = Fixtures::new();
        let result = cart::run(
            LoadOptions::default(),
            &fixtures.path("orders.json"),
            &fixtures.path("catalog.json"),
            &["yoga-mat".to_string(), "strap".to_string()],
        );
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(decimal_field(&payload["analysis"]["cart_value"]), 47.9);
        assert_eq!(payload["analysis"]["product_count"], 2);
        let gap = payload["analysis"]["cart_score"].as_f64().expect("cart score");
        assert!((0.0..=100.0).contains(&gap));
    });
}

#[test]
fn invalid_config_exits_with_config_code() {
    with_env(&[("MERCHSCOPE_SCORING_HIGH_POTENTIAL", "10")], || {
        let fixtures = Fixtures::new();
        let result = score::run(LoadOptions::default(), &fixtures.path("signals.json"), None, None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "score");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_attributes_sources() {
    with_env(&[("MERCHSCOPE_MINING_MIN_LIFT", "1.3")], || {
        let fixtures = Fixtures::new();
        let path = fixtures.write("merchscope.toml", "[recommendations]\nmax_upsells = 6\n");

        let result = config::run(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let values = payload["values"].as_array().expect("values array");
        let find = |key: &str| {
            values.iter().find(|line| line["key"] == key).cloned().expect("key should be listed")
        };

        assert_eq!(find("mining.min_lift")["value"], "1.3");
        assert_eq!(find("mining.min_lift")["source"], "env (MERCHSCOPE_MINING_MIN_LIFT)");
        assert_eq!(find("recommendations.max_upsells")["value"], "6");
        assert!(find("recommendations.max_upsells")["source"]
            .as_str()
            .is_some_and(|source| source.starts_with("file (")));
        assert_eq!(find("logging.level")["source"], "default");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn decimal_field(value: &Value) -> f64 {
    match value {
        Value::String(raw) => raw.parse().expect("decimal string should parse"),
        other => other.as_f64().expect("decimal should be numeric"),
    }
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "MERCHSCOPE_SCORING_NICHE_ADJUSTMENTS",
        "MERCHSCOPE_SCORING_HIGH_POTENTIAL",
        "MERCHSCOPE_SCORING_MEDIUM_POTENTIAL",
        "MERCHSCOPE_SCORING_LOW_POTENTIAL",
        "MERCHSCOPE_MINING_MIN_SUPPORT",
        "MERCHSCOPE_MINING_MIN_CONFIDENCE",
        "MERCHSCOPE_MINING_MIN_LIFT",
        "MERCHSCOPE_MINING_MAX_ITEMSET_SIZE",
        "MERCHSCOPE_RECOMMENDATIONS_MAX_COMPLEMENTARY",
        "MERCHSCOPE_RECOMMENDATIONS_MAX_UPSELLS",
        "MERCHSCOPE_RECOMMENDATIONS_BUNDLE_CANDIDATES",
        "MERCHSCOPE_RECOMMENDATIONS_BASE_BUNDLE_DISCOUNT",
        "MERCHSCOPE_RECOMMENDATIONS_PER_ITEM_BUNDLE_DISCOUNT",
        "MERCHSCOPE_RECOMMENDATIONS_MAX_BUNDLE_DISCOUNT",
        "MERCHSCOPE_RECOMMENDATIONS_MAX_CART_SUGGESTIONS",
        "MERCHSCOPE_LOGGING_LEVEL",
        "MERCHSCOPE_LOGGING_FORMAT",
        "MERCHSCOPE_LOG_LEVEL",
        "MERCHSCOPE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
