//! In-memory table and the feature/label view derived from it.
//!
//! `Dataset` is column oriented: each column is either numeric or
//! categorical, with `None` marking a missing cell. `FeatureSet` is the
//! numeric matrix plus binary labels that the split, scaler and model work on.
use std::collections::HashSet;

use ndarray::Array2;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Categorical(values) => values.iter().filter(|v| v.is_none()).count(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset, checking that all columns have the same length and
    /// unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if column.data.len() != n_rows {
                return Err(PipelineError::ShapeMismatch {
                    expected: n_rows,
                    found: column.data.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(PipelineError::ParseError(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Dataset { columns, n_rows })
    }

    pub fn nrows(&self) -> usize {
        self.n_rows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Drop the named columns; names that do not exist are ignored.
    pub fn drop_columns(self, names: &[String]) -> Self {
        let n_rows = self.n_rows;
        let columns = self
            .columns
            .into_iter()
            .filter(|c| !names.contains(&c.name))
            .collect();
        Dataset { columns, n_rows }
    }

    pub fn log_summary(&self) {
        let numeric = self.columns.iter().filter(|c| c.data.is_numeric()).count();
        let missing: usize = self.columns.iter().map(|c| c.data.missing_count()).sum();
        log::info!(
            "Dataset: {} rows, {} columns ({} numeric, {} categorical), {} missing cells",
            self.n_rows,
            self.columns.len(),
            numeric,
            self.columns.len() - numeric,
            missing
        );
    }

    /// Split off `target` as the label vector and turn every other column
    /// into a feature.
    ///
    /// All remaining columns must be numeric (i.e. the dataset has been
    /// encoded). Missing feature cells become `NaN`. The target must hold
    /// only 0 and 1.
    pub fn to_feature_set(&self, target: &str) -> Result<FeatureSet> {
        let target_idx = self.column_index(target).ok_or_else(|| {
            log::error!("Target column \"{}\" not found", target);
            PipelineError::ColumnNotFound(target.to_string())
        })?;

        let labels = match &self.columns[target_idx].data {
            ColumnData::Numeric(values) => values
                .iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Some(x) if *x == 0.0 => Ok(0u8),
                    Some(x) if *x == 1.0 => Ok(1u8),
                    Some(x) => Err(PipelineError::InvalidLabels(format!(
                        "target '{}' has value {} at row {}, expected 0 or 1",
                        target, x, row
                    ))),
                    None => Err(PipelineError::InvalidLabels(format!(
                        "target '{}' is missing at row {}",
                        target, row
                    ))),
                })
                .collect::<Result<Vec<u8>>>()?,
            ColumnData::Categorical(_) => {
                return Err(PipelineError::InvalidLabels(format!(
                    "target '{}' is not numeric",
                    target
                )))
            }
        };

        let feature_columns: Vec<&Column> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, c)| c)
            .collect();

        let n_features = feature_columns.len();
        let mut data = vec![0.0f64; self.n_rows * n_features];
        for (j, column) in feature_columns.iter().enumerate() {
            let values = match &column.data {
                ColumnData::Numeric(values) => values,
                ColumnData::Categorical(_) => {
                    return Err(PipelineError::InvalidConfig(format!(
                        "feature column '{}' is not numeric; encode the dataset first",
                        column.name
                    )))
                }
            };
            for (i, v) in values.iter().enumerate() {
                data[i * n_features + j] = v.unwrap_or(f64::NAN);
            }
        }

        let x = Array2::from_shape_vec((self.n_rows, n_features), data).map_err(|e| {
            PipelineError::ParseError(format!("failed to build feature matrix: {}", e))
        })?;

        Ok(FeatureSet {
            x,
            y: labels,
            feature_names: feature_columns.iter().map(|c| c.name.clone()).collect(),
        })
    }
}

/// Feature matrix (rows = samples) with aligned binary labels.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub x: Array2<f64>,
    pub y: Vec<u8>,
    pub feature_names: Vec<String>,
}

impl FeatureSet {
    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.y)
    }
}

/// Number of 0 and 1 labels.
pub fn class_counts(y: &[u8]) -> [usize; 2] {
    let positives = y.iter().filter(|&&v| v == 1).count();
    [y.len() - positives, positives]
}
