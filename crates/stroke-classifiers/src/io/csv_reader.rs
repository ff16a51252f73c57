//! Delimited text reader producing a typed [`Dataset`].
use std::io::ErrorKind;
use std::path::Path;

use csv::StringRecord;

use crate::data_handling::{Column, Dataset};
use crate::error::{PipelineError, Result};

/// Cell contents treated as a missing value.
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "-NaN", "nan", "NULL", "null", "None", "<NA>",
];

/// Configuration for reading delimited files.
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    pub delimiter: u8,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Read a comma separated file with a header row.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_csv_with_config(path, &CsvReaderConfig::default())
}

/// Read a delimited file with a header row into a [`Dataset`].
///
/// A column is numeric when every present cell parses as a float, otherwise
/// it is categorical. Cells matching [`MISSING_MARKERS`] are missing. Errors
/// are logged before being returned.
pub fn read_csv_with_config<P: AsRef<Path>>(path: P, config: &CsvReaderConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let dataset = read_records(path, config).map_err(|e| {
        match &e {
            PipelineError::FileNotFound(p) => {
                log::error!("File not found at path: {}", p.display())
            }
            other => log::error!("Failed to load {}: {}", path.display(), other),
        }
        e
    })?;
    log::info!(
        "Loaded {} rows and {} columns from {}",
        dataset.nrows(),
        dataset.ncols(),
        path.display()
    );
    Ok(dataset)
}

fn read_records(path: &Path, config: &CsvReaderConfig) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| map_csv_error(path, e))?;

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| map_csv_error(path, e))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::ParseError(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            PipelineError::ParseError(format!("row {}: {}", row_idx + 1, e))
        })?;
        for (col_idx, cell) in record.iter().enumerate() {
            raw[col_idx].push(parse_cell(cell));
        }
    }

    let columns = headers
        .iter()
        .zip(raw)
        .map(|(name, values)| infer_column(name.trim(), values))
        .collect();

    Dataset::new(columns)
}

fn map_csv_error(path: &Path, err: csv::Error) -> PipelineError {
    if let csv::ErrorKind::Io(io_err) = err.kind() {
        if io_err.kind() == ErrorKind::NotFound {
            return PipelineError::FileNotFound(path.to_path_buf());
        }
    }
    PipelineError::ParseError(err.to_string())
}

fn parse_cell(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn infer_column(name: &str, values: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|v| match v {
            Some(s) => s.parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();

    match parsed {
        Some(numbers) => Column::numeric(name, numbers),
        None => Column::categorical(name, values),
    }
}
