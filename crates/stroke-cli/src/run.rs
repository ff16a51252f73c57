//! Run configuration, CLI overrides and artifact writing.
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use stroke_classifiers::config::{ClassWeight, Penalty, PipelineConfig, Solver};
use stroke_classifiers::pipeline::{self, PipelineOutcome};
use stroke_classifiers::report::build_evaluation_report;
use stroke_classifiers::stats::{ConfusionMatrix, Metrics};

use crate::util::{delimiter_for_path, ensure_output_dir, validate_tsv_or_csv_extension};

pub const REPORT_FILE: &str = "stroke_report.html";
pub const METRICS_FILE: &str = "metrics.json";

/// Pipeline settings plus where the run writes its artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
    pub output_dir: Option<PathBuf>,
    pub report: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            output_dir: None,
            report: true,
        }
    }
}

impl RunConfig {
    /// Load `config_path` (or the defaults) and apply the overrides given on
    /// the command line.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => load_run_config(path)?,
            None => RunConfig::default(),
        };

        if let Some(data) = matches.get_one::<PathBuf>("data") {
            validate_tsv_or_csv_extension(data)?;
            if let Some(delimiter) = delimiter_for_path(data) {
                config.pipeline.preprocess.delimiter = delimiter;
            }
            config.pipeline.data_path = data.clone();
        }

        if let Some(target) = matches.get_one::<String>("target") {
            config.pipeline.target_column = target.clone();
        }

        if let Some(test_size) = matches.get_one::<f64>("test_size") {
            config.pipeline.split.test_size = *test_size;
        }

        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.pipeline.split.seed = *seed;
            config.pipeline.model.seed = *seed;
        }

        if let Some(penalty) = matches.get_one::<String>("penalty") {
            config.pipeline.model.penalty = Penalty::from_str(penalty).map_err(anyhow::Error::msg)?;
        }

        if let Some(solver) = matches.get_one::<String>("solver") {
            config.pipeline.model.solver = Solver::from_str(solver).map_err(anyhow::Error::msg)?;
        }

        if let Some(c) = matches.get_one::<f64>("c") {
            config.pipeline.model.c = *c;
        }

        if let Some(class_weight) = matches.get_one::<String>("class_weight") {
            config.pipeline.model.class_weight =
                ClassWeight::from_str(class_weight).map_err(anyhow::Error::msg)?;
        }

        if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
            config.output_dir = Some(output_dir.clone());
        }

        if matches.get_flag("no_report") {
            config.report = false;
        }

        config
            .pipeline
            .validate()
            .context("Invalid run configuration")?;
        Ok(config)
    }
}

/// Load a run configuration from a JSON file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: RunConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Contents of `metrics.json`.
#[derive(Debug, Serialize)]
pub struct MetricsSummary<'a> {
    pub metrics: &'a Metrics,
    pub confusion_matrix: &'a ConfusionMatrix,
    pub test_rows: usize,
    pub train_rows: usize,
    pub intercept: f64,
    pub coefficients: Vec<(&'a str, f64)>,
    pub n_iter: usize,
}

impl<'a> MetricsSummary<'a> {
    pub fn from_outcome(outcome: &'a PipelineOutcome) -> Self {
        MetricsSummary {
            metrics: &outcome.metrics,
            confusion_matrix: &outcome.confusion_matrix,
            test_rows: outcome.y_test.len(),
            train_rows: outcome.train_rows,
            intercept: outcome.coefficients.intercept,
            coefficients: outcome
                .feature_names
                .iter()
                .map(String::as_str)
                .zip(outcome.coefficients.weights.iter().copied())
                .collect(),
            n_iter: outcome.coefficients.n_iter,
        }
    }
}

/// One `name: value` line per metric.
pub fn format_metrics(metrics: &Metrics) -> String {
    metrics
        .entries()
        .iter()
        .map(|(name, value)| format!("{}: {:.4}\n", name, value))
        .collect()
}

pub fn write_metrics(outcome: &PipelineOutcome, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&MetricsSummary::from_outcome(outcome))?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write metrics: {}", path.display()))?;
    log::info!("Metrics written to {}", path.display());
    Ok(())
}

pub fn write_report(outcome: &PipelineOutcome, config: &RunConfig, path: &Path) -> Result<()> {
    let report = build_evaluation_report(outcome, &config.pipeline)?;
    report.save_to_file(path)?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

/// Run the pipeline and write the configured artifacts.
pub fn execute(config: &RunConfig) -> Result<PipelineOutcome> {
    let outcome = pipeline::run(&config.pipeline).with_context(|| {
        format!(
            "Pipeline run on {} failed",
            config.pipeline.data_path.display()
        )
    })?;

    let out_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    if config.output_dir.is_some() {
        ensure_output_dir(&out_dir)?;
        write_metrics(&outcome, &out_dir.join(METRICS_FILE))?;
    }
    if config.report {
        write_report(&outcome, config, &out_dir.join(REPORT_FILE))?;
    }
    Ok(outcome)
}
