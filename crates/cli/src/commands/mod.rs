pub mod bundle;
pub mod cart;
pub mod config;
pub mod recommend;
pub mod rules;
pub mod score;

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use merchscope_core::config::{AppConfig, LoadOptions};
use merchscope_core::recommend::{transactions_from_json, ComplementaryAnalyzer, Transaction};
use merchscope_core::{ApplicationError, ProductMetadata};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct CommandReport<'a, T: Serialize> {
    command: &'a str,
    status: &'static str,
    generated_at: String,
    #[serde(flatten)]
    data: T,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Successful run carrying a structured report alongside the status fields.
    pub fn report<T: Serialize>(command: &str, data: T) -> Self {
        let report = CommandReport {
            command,
            status: "ok",
            generated_at: Utc::now().to_rfc3339(),
            data,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }

    pub(crate) fn from_outcome<T: Serialize>(
        command: &str,
        outcome: Result<T, ApplicationError>,
    ) -> Self {
        match outcome {
            Ok(data) => Self::report(command, data),
            Err(error) => Self::from_error(command, &error),
        }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(options: LoadOptions) -> Result<AppConfig, ApplicationError> {
    AppConfig::load(options).map_err(ApplicationError::from)
}

pub(crate) fn read_json(path: &Path) -> Result<Value, ApplicationError> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read `{}`", path.display()))
        .map_err(|error| ApplicationError::Io(format!("{error:#}")))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not valid JSON", path.display()))
        .map_err(|error| ApplicationError::Parse(format!("{error:#}")))
}

pub(crate) fn read_transactions(path: &Path) -> Result<Vec<Transaction>, ApplicationError> {
    let value = read_json(path)?;
    Ok(transactions_from_json(&value)?)
}

pub(crate) fn read_catalog(path: &Path) -> Result<Vec<ProductMetadata>, ApplicationError> {
    let value = read_json(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("`{}` is not a product catalog array", path.display()))
        .map_err(|error| ApplicationError::Parse(format!("{error:#}")))
}

/// Analyzer configured from `config`, fitted on the orders and loaded with the catalog.
pub(crate) fn build_analyzer(
    config: &AppConfig,
    orders: &Path,
    catalog: &Path,
) -> Result<ComplementaryAnalyzer, ApplicationError> {
    let transactions = read_transactions(orders)?;
    let products = read_catalog(catalog)?;

    let mut analyzer =
        ComplementaryAnalyzer::new(config.miner_thresholds(), config.analyzer_settings())?;
    analyzer.load_transactions(&transactions)?;
    analyzer.load_product_metadata(products)?;
    Ok(analyzer)
}
