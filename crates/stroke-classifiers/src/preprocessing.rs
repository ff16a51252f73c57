//! Imputation, one-hot encoding and feature standardization.
//!
//! `preprocess` turns a freshly loaded [`Dataset`] into numeric features:
//! numeric gaps are filled with the column median, categorical columns are
//! expanded into `k - 1` indicator columns. The target column is kept as is. The [`Scaler`] is fitted on the
//! train matrix only and then applied unchanged to the test matrix.
use std::collections::{BTreeSet, HashMap, HashSet};

use ndarray::Array2;
use statrs::statistics::Statistics;

use crate::config::{CategoricalMissing, PreprocessConfig};
use crate::data_handling::{Column, ColumnData, Dataset};
use crate::error::{PipelineError, Result};

/// Drop ignored columns, impute and encode every column except `target`.
///
/// The target column is passed through untouched so that missing or
/// non-numeric labels are reported when the labels are extracted.
pub fn preprocess(dataset: Dataset, config: &PreprocessConfig, target: &str) -> Result<Dataset> {
    if dataset.is_empty() {
        log::error!("Data is not loaded: the dataset has no columns or rows");
        return Err(PipelineError::NotLoaded);
    }
    let dataset = if config.ignore_columns.is_empty() {
        dataset
    } else {
        log::debug!("Dropping ignored columns: {:?}", config.ignore_columns);
        dataset.drop_columns(&config.ignore_columns)
    };

    let mut columns = dataset.into_columns();
    let target_column = match columns.iter().position(|c| c.name == target) {
        Some(idx) => {
            // Features end up with the numeric columns first, so the target
            // goes back after the numeric columns that preceded it.
            let slot = columns[..idx].iter().filter(|c| c.data.is_numeric()).count();
            let column = columns.remove(idx);
            let missing = column.data.missing_count();
            if missing > 0 {
                log::warn!(
                    "Target column {} has {} missing values; they are not imputed",
                    target,
                    missing
                );
            } else {
                log::debug!("Target column {} is left out of imputation and encoding", target);
            }
            Some((slot, column))
        }
        None => None,
    };

    let dataset = impute_missing(Dataset::new(columns)?, config.categorical_missing)?;
    let dataset = one_hot_encode(dataset)?;
    let dataset = match target_column {
        Some((slot, column)) => {
            let mut columns = dataset.into_columns();
            if columns.iter().any(|c| c.name == column.name) {
                return Err(encoded_name_clash(&column.name));
            }
            columns.insert(slot.min(columns.len()), column);
            Dataset::new(columns)?
        }
        None => dataset,
    };
    log::info!(
        "Preprocessing done: {} rows, {} columns",
        dataset.nrows(),
        dataset.ncols()
    );
    Ok(dataset)
}

/// Median of the values; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent category; ties go to the lexicographically smallest one.
pub fn most_frequent(values: &[Option<String>]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_name, a_count), (b_name, b_count)| {
            a_count.cmp(b_count).then_with(|| b_name.cmp(a_name))
        })
        .map(|(name, _)| name.to_string())
}

/// Fill missing numeric cells with the column median.
///
/// Categorical gaps are filled with the mode only under
/// [`CategoricalMissing::MostFrequent`]; otherwise they are reported and left.
pub fn impute_missing(dataset: Dataset, policy: CategoricalMissing) -> Result<Dataset> {
    let columns = dataset
        .into_columns()
        .into_iter()
        .map(|column| impute_column(column, policy))
        .collect();
    Dataset::new(columns)
}

fn impute_column(column: Column, policy: CategoricalMissing) -> Column {
    let missing = column.data.missing_count();
    if missing == 0 {
        return column;
    }
    let Column { name, data } = column;
    match data {
        ColumnData::Numeric(values) => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            match median(&present) {
                Some(m) => {
                    log::info!(
                        "Filled {} missing values in column {} with the median ({})",
                        missing,
                        name,
                        m
                    );
                    Column::numeric(name, values.into_iter().map(|v| v.or(Some(m))).collect())
                }
                None => {
                    log::warn!(
                        "Column {} has no values to compute a median from; left unimputed",
                        name
                    );
                    Column::numeric(name, values)
                }
            }
        }
        ColumnData::Categorical(values) => match policy {
            CategoricalMissing::Ignore => {
                log::warn!(
                    "Missing values in column {} are not numeric and were not imputed",
                    name
                );
                Column::categorical(name, values)
            }
            CategoricalMissing::MostFrequent => match most_frequent(&values) {
                Some(mode) => {
                    log::info!(
                        "Filled {} missing values in column {} with the most frequent value ({})",
                        missing,
                        name,
                        mode
                    );
                    Column::categorical(
                        name,
                        values
                            .into_iter()
                            .map(|v| v.or_else(|| Some(mode.clone())))
                            .collect(),
                    )
                }
                None => {
                    log::warn!("Column {} has no categories; left unimputed", name);
                    Column::categorical(name, values)
                }
            },
        },
    }
}

/// Replace each categorical column with `k - 1` indicator columns.
///
/// Categories are sorted and the first one is the dropped reference. Numeric
/// columns keep their order; indicators are appended after them, grouped by
/// source column. Missing cells get 0 in every indicator.
pub fn one_hot_encode(dataset: Dataset) -> Result<Dataset> {
    let mut numeric = Vec::new();
    let mut encoded: Vec<Column> = Vec::new();
    let mut n_categorical = 0usize;

    let columns = dataset.into_columns();
    let numeric_names: HashSet<String> = columns
        .iter()
        .filter(|c| c.data.is_numeric())
        .map(|c| c.name.clone())
        .collect();

    for column in columns {
        match column.data {
            ColumnData::Numeric(_) => numeric.push(column),
            ColumnData::Categorical(values) => {
                n_categorical += 1;
                let categories: BTreeSet<&str> =
                    values.iter().flatten().map(String::as_str).collect();
                for category in categories.iter().skip(1) {
                    let name = format!("{}_{}", column.name, category);
                    if numeric_names.contains(&name) || encoded.iter().any(|c| c.name == name) {
                        return Err(encoded_name_clash(&name));
                    }
                    let indicator = values
                        .iter()
                        .map(|v| {
                            Some(if v.as_deref() == Some(*category) {
                                1.0
                            } else {
                                0.0
                            })
                        })
                        .collect();
                    encoded.push(Column::numeric(name, indicator));
                }
                log::debug!(
                    "Encoded column {} ({} categories, reference {:?})",
                    column.name,
                    categories.len(),
                    categories.iter().next()
                );
            }
        }
    }

    if n_categorical > 0 {
        log::info!(
            "Categorical features encoded: {} columns into {} indicators",
            n_categorical,
            encoded.len()
        );
    }
    numeric.extend(encoded);
    Dataset::new(numeric)
}

fn encoded_name_clash(name: &str) -> PipelineError {
    log::error!("One-hot encoding produced column {} which already exists", name);
    PipelineError::InvalidConfig(format!(
        "encoded column '{}' clashes with an existing column; rename or ignore one of them",
        name
    ))
}

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Apply `(x - mean) / std` column-wise.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: self.mean.len(),
                found: x.ncols(),
            });
        }
        let mut out = x.to_owned();
        for (c, mut column) in out.columns_mut().into_iter().enumerate() {
            let (mean, std) = (self.mean[c], self.std[c]);
            column.mapv_inplace(|v| (v - mean) / std);
        }
        Ok(out)
    }
}

/// Fit a `Scaler` from a matrix where rows are samples and columns are
/// features. Uses the population standard deviation; a constant column gets
/// a divisor of 1 so it is only centered.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    if x.nrows() == 0 {
        log::error!("Data is not split: cannot fit a scaler on an empty train subset");
        return Err(PipelineError::NotSplit);
    }
    let mut mean = Vec::with_capacity(x.ncols());
    let mut std = Vec::with_capacity(x.ncols());
    for column in x.columns() {
        let m = column.iter().mean();
        let s = column.iter().population_std_dev();
        mean.push(m);
        std.push(if s == 0.0 { 1.0 } else { s });
    }
    Ok(Scaler { mean, std })
}

/// Fit on `x_train` and transform both matrices with the same parameters.
pub fn scale_train_test(
    x_train: &Array2<f64>,
    x_test: &Array2<f64>,
) -> Result<(Scaler, Array2<f64>, Array2<f64>)> {
    let scaler = fit_scaler(x_train)?;
    let train = scaler.transform(x_train)?;
    let test = scaler.transform(x_test)?;
    log::info!("Features scaled ({} columns)", scaler.mean.len());
    Ok((scaler, train, test))
}
