pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use merchscope_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    name = "merchscope",
    about = "Merchscope product scoring and recommendation CLI",
    long_about = "Score product opportunities from collected signals, mine purchase rules, and build complementary, upsell, bundle and cart recommendations.",
    after_help = "Examples:\n  merchscope score signals.json --top 10\n  merchscope rules orders.json --product yoga-mat\n  merchscope cart orders.json catalog.json yoga-mat strap"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a merchscope.toml file (must exist when given)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Score a JSON array of product signals (a single object is accepted)")]
    Score {
        signals: PathBuf,
        #[arg(long, help = "Score every product under this niche instead of its own")]
        niche: Option<String>,
        #[arg(long, help = "Also report the N best scored products")]
        top: Option<usize>,
    },
    #[command(about = "Mine association rules from a JSON array of transactions")]
    Rules {
        orders: PathBuf,
        #[arg(long, help = "Only show rules involving this product id")]
        product: Option<String>,
    },
    #[command(about = "Complementary and upsell suggestions for one product")]
    Recommend { orders: PathBuf, catalog: PathBuf, product_id: String },
    #[command(about = "Discounted bundle offers built around the given products")]
    Bundle {
        orders: PathBuf,
        catalog: PathBuf,
        #[arg(required = true)]
        product_ids: Vec<String>,
    },
    #[command(about = "Analyze a cart: value, missing complements, upsells, bundles")]
    Cart {
        orders: PathBuf,
        catalog: PathBuf,
        #[arg(required = true)]
        product_ids: Vec<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    // Commands report configuration failures themselves; logging just falls back to defaults.
    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging);

    let result = match cli.command {
        Command::Score { signals, niche, top } => {
            commands::score::run(options, &signals, niche.as_deref(), top)
        }
        Command::Rules { orders, product } => {
            commands::rules::run(options, &orders, product.as_deref())
        }
        Command::Recommend { orders, catalog, product_id } => {
            commands::recommend::run(options, &orders, &catalog, &product_id)
        }
        Command::Bundle { orders, catalog, product_ids } => {
            commands::bundle::run(options, &orders, &catalog, &product_ids)
        }
        Command::Cart { orders, catalog, product_ids } => {
            commands::cart::run(options, &orders, &catalog, &product_ids)
        }
        Command::Config => commands::config::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the JSON report.
pub fn init_logging(config: &LoggingConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in another binary.
    let _ = match config.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
