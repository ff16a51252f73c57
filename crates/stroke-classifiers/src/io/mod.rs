//! Readers for delimited input files.
pub mod csv_reader;

pub use csv_reader::{read_csv, read_csv_with_config, CsvReaderConfig, MISSING_MARKERS};
