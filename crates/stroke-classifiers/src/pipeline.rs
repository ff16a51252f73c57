//! End-to-end run: load, preprocess, split, scale, fit, predict, evaluate.
//!
//! Each stage hands its output to the next one; a failing stage stops the
//! run and its error is returned unchanged.
use crate::config::PipelineConfig;
use crate::data_handling::Dataset;
use crate::error::{PipelineError, Result};
use crate::io::{read_csv_with_config, CsvReaderConfig};
use crate::models::logistic::FittedCoefficients;
use crate::models::{ClassifierModel, LogisticRegression, Predictions};
use crate::preprocessing::{preprocess, scale_train_test, Scaler};
use crate::split::train_test_split;
use crate::stats::{evaluate, ConfusionMatrix, Metrics};

/// Everything the presenter and the CLI need from a finished run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub metrics: Metrics,
    pub y_test: Vec<u8>,
    pub predictions: Predictions,
    pub confusion_matrix: ConfusionMatrix,
    pub feature_names: Vec<String>,
    pub coefficients: FittedCoefficients,
    pub scaler: Scaler,
    pub model_name: String,
    pub train_rows: usize,
}

/// Load the configured file and run every stage on it.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;
    let reader_config = CsvReaderConfig {
        delimiter: delimiter_byte(config.preprocess.delimiter)?,
    };
    let dataset = read_csv_with_config(&config.data_path, &reader_config)?;
    run_on_dataset(dataset, config)
}

/// Run every stage after loading on an in-memory dataset.
pub fn run_on_dataset(dataset: Dataset, config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;
    dataset.log_summary();

    let dataset = preprocess(dataset, &config.preprocess, &config.target_column)?;

    let split = train_test_split(&dataset, &config.target_column, &config.split)?;

    let (scaler, x_train, x_test) = scale_train_test(&split.x_train, &split.x_test)?;

    let mut model = LogisticRegression::new(config.model.clone());
    model.fit(&x_train, &split.y_train)?;

    let predictions = model.predict(&x_test)?;
    log::info!("Predictions made for {} test rows", predictions.len());

    let metrics = evaluate(&split.y_test, &predictions)?;
    let confusion_matrix = ConfusionMatrix::from_labels(&split.y_test, &predictions.labels);
    let coefficients = model
        .coefficients()
        .cloned()
        .ok_or(PipelineError::NotTrained)?;

    Ok(PipelineOutcome {
        metrics,
        y_test: split.y_test,
        predictions,
        confusion_matrix,
        feature_names: split.feature_names,
        coefficients,
        scaler,
        model_name: model.name().to_string(),
        train_rows: split.y_train.len(),
    })
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "delimiter must be a single ASCII character, got '{}'",
            delimiter
        )))
    }
}
