//! Redact command implementation
//!
//! Runs the full pipeline over one or more text files. Multiple inputs are
//! processed concurrently with a bounded worker pool; Ctrl-C cancels
//! in-flight work, including the validation request.

use crate::config::load_config;
use crate::domain::span::PiiCategory;
use crate::domain::{RedactionOutcome, RedactionSettings, RedactionStyle};
use crate::engine::RedactionEngine;
use anyhow::Context;
use clap::Args;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the redact command
#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Input text file(s) to redact
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output path (only valid with a single input; defaults to
    /// <input>.redacted.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated categories to redact
    /// (email,phone,name,address,ssn,credit_card); all when omitted
    #[arg(long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Redaction style: labels, black-boxes, or custom
    #[arg(long, default_value = "labels")]
    pub style: String,

    /// Replacement text used with --style custom
    #[arg(long)]
    pub custom_label: Option<String>,

    /// Print the validator's explanation for each input
    #[arg(long)]
    pub explain: bool,

    /// Maximum number of inputs processed concurrently
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
}

impl RedactArgs {
    /// Execute the redact command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let settings = self.build_settings().context("Invalid redaction settings")?;
        let engine = Arc::new(RedactionEngine::new(&config)?);

        if self.output.is_some() && self.inputs.len() > 1 {
            eprintln!("❌ --output is only valid with a single input file");
            return Ok(2);
        }

        let concurrency = self.concurrency.max(1);
        let settings = Arc::new(settings);

        let work = stream::iter(self.inputs.clone())
            .map(|input| {
                let engine = Arc::clone(&engine);
                let settings = Arc::clone(&settings);
                async move {
                    let outcome = redact_file(&engine, &settings, &input).await;
                    (input, outcome)
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>();

        // Ctrl-C drops the batch future, aborting in-flight validation
        // requests along with it.
        let results = tokio::select! {
            results = work => results,
            _ = shutdown_signal.changed() => {
                tracing::info!("Shutdown requested, cancelling in-flight redaction");
                println!("⚠️  Cancelled");
                return Ok(1);
            }
        };

        let mut failures = 0;
        for (input, result) in results {
            match result {
                Ok(outcome) => {
                    let output_path = self
                        .output
                        .clone()
                        .unwrap_or_else(|| default_output_path(&input));
                    tokio::fs::write(&output_path, &outcome.redacted)
                        .await
                        .with_context(|| {
                            format!("Failed to write {}", output_path.display())
                        })?;

                    print_summary(&input, &output_path, &outcome);
                    if self.explain && !outcome.explanation.is_empty() {
                        println!("   Explanation: {}", outcome.explanation);
                    }
                }
                Err(e) => {
                    failures += 1;
                    eprintln!("❌ {}: {e}", input.display());
                }
            }
        }

        Ok(if failures == 0 { 0 } else { 1 })
    }

    /// Translate CLI flags into engine settings
    fn build_settings(&self) -> anyhow::Result<RedactionSettings> {
        let categories: BTreeSet<PiiCategory> = match &self.categories {
            Some(names) => names
                .iter()
                .map(|name| name.parse().map_err(|e: String| anyhow::anyhow!(e)))
                .collect::<anyhow::Result<_>>()?,
            None => PiiCategory::ALL.into_iter().collect(),
        };

        let style = match self.style.as_str() {
            "labels" => RedactionStyle::Labels,
            "black-boxes" | "black_boxes" => RedactionStyle::BlackBoxes,
            "custom" => RedactionStyle::Custom,
            other => anyhow::bail!("Unknown redaction style: {other}"),
        };

        let mut settings = RedactionSettings::new(categories, style);
        if let Some(label) = &self.custom_label {
            settings = settings.with_custom_label(label.clone());
        }

        settings
            .validate()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(settings)
    }
}

async fn redact_file(
    engine: &RedactionEngine,
    settings: &RedactionSettings,
    input: &Path,
) -> anyhow::Result<RedactionOutcome> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    Ok(engine.redact(&text, settings).await?)
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".redacted.txt");
    input.with_file_name(name)
}

fn print_summary(input: &Path, output: &Path, outcome: &RedactionOutcome) {
    println!(
        "✅ {} -> {} ({} spans, {} ms)",
        input.display(),
        output.display(),
        outcome.total_spans(),
        outcome.processing_time_ms
    );
    for (category, count) in &outcome.statistics {
        if *count > 0 {
            println!("   {category}: {count}");
        }
    }
}
