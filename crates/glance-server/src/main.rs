//! Standalone analysis binary.
//!
//! Loads a CSV/JSON/XLSX file, runs the quality and detection passes,
//! stores the dataset through the service layer and prints the summary
//! report plus dataset insights. An optional second argument is answered
//! as a free-text question.

mod cache;
mod config;
mod logging;
mod service;
mod store;

use anyhow::{bail, Context, Result};
use config::Config;
use glance_insight::{answer, build_report, dataset_insights, render_text};
use glance_parse::{
    clean, detect_field_types, field_suggestions, parse_csv, parse_excel, parse_json, validate,
};
use service::DatasetService;
use std::path::Path;
use std::sync::Arc;
use store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = if Path::new("config.yaml").exists() {
        Config::load("config.yaml").context("failed to load config.yaml")?
    } else {
        Config::from_env()
    };
    config.apply_logging_env();
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: glance-server <data-file> [question]");
    };
    let question = args.next();

    let rows = load_file(&path)?;
    tracing::info!(path = %path, rows = rows.len(), "file loaded");

    let report = validate(&rows);
    for error in &report.errors {
        tracing::error!(%error, "validation error");
    }
    for warning in &report.warnings {
        tracing::warn!(%warning, "validation warning");
    }
    if !report.valid {
        bail!("dataset failed validation: {}", report.errors.join("; "));
    }

    let rows = clean(&rows);
    let fields = detect_field_types(&rows);
    let suggestions = field_suggestions(&fields);
    tracing::info!(
        numeric = suggestions.numeric.len(),
        categorical = suggestions.categorical.len(),
        "field kinds detected"
    );

    let service = DatasetService::new(
        Arc::new(MemoryStore::new()),
        std::time::Duration::from_secs(config.cache.ttl_secs),
        config.engine.clone(),
    );
    let name = Path::new(&path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let dataset = service.create_dataset("local", &name, rows).await?;

    println!("{}", render_text(&build_report(&dataset.rows)));

    let insights = dataset_insights(&dataset.rows);
    if !insights.is_empty() {
        println!("INSIGHTS");
        for insight in &insights {
            println!("  {}", insight.title);
            println!("    {}", insight.description);
        }
    }

    if let Some(question) = question {
        let reply = answer(&question, &dataset.rows);
        println!("\nQ: {}", question);
        println!("A: {}", reply.answer);
        println!("   {}", reply.recommendation);
    }

    Ok(())
}

fn load_file(path: &str) -> Result<Vec<glance_core::Record>> {
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path))?;
            Ok(parse_csv(&text))
        }
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path))?;
            parse_json(&text).context("failed to parse JSON dataset")
        }
        "xlsx" | "xls" | "ods" => {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path))?;
            parse_excel(&bytes).context("failed to parse spreadsheet")
        }
        other => bail!("unsupported file extension '{}'", other),
    }
}
