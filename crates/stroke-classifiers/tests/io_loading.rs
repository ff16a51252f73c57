//! Integration tests for the CSV loader.

mod common;

use stroke_classifiers::data_handling::ColumnData;
use stroke_classifiers::error::PipelineError;
use stroke_classifiers::io::{read_csv, read_csv_with_config, CsvReaderConfig};

use common::{synthetic_stroke_csv, write_file};

#[test]
fn well_formed_csv_keeps_rows_and_header() {
    let dir = tempfile::tempdir().unwrap();
    let contents = synthetic_stroke_csv();
    let path = write_file(dir.path(), "stroke.csv", &contents);

    let dataset = read_csv(&path).unwrap();
    let file_lines = contents.lines().count();
    assert_eq!(dataset.nrows(), file_lines - 1);
    assert_eq!(dataset.column_names(), vec!["age", "gender", "stroke"]);
}

#[test]
fn column_types_are_inferred() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "stroke.csv", &synthetic_stroke_csv());
    let dataset = read_csv(&path).unwrap();

    let age = dataset.column("age").unwrap();
    assert!(age.data.is_numeric());
    assert_eq!(age.data.missing_count(), 5);

    match &dataset.column("gender").unwrap().data {
        ColumnData::Categorical(values) => assert_eq!(values[0].as_deref(), Some("M")),
        other => panic!("gender should be categorical, got {:?}", other),
    }
}

#[test]
fn missing_markers_are_recognized() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "bmi.csv",
        "id,bmi,smoking_status\n1,28.1,never smoked\n2,N/A,\n3,NaN,smokes\n",
    );
    let dataset = read_csv(&path).unwrap();
    assert_eq!(dataset.column("bmi").unwrap().data.missing_count(), 2);
    assert!(dataset.column("bmi").unwrap().data.is_numeric());
    assert_eq!(dataset.column("smoking_status").unwrap().data.missing_count(), 1);
}

#[test]
fn nonexistent_path_is_file_not_found() {
    let err = read_csv("/nonexistent/path/stroke.csv").unwrap_err();
    assert!(matches!(err, PipelineError::FileNotFound(_)), "got {:?}", err);
}

#[test]
fn ragged_rows_are_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad.csv", "a,b\n1,2\n3\n");
    let err = read_csv(&path).unwrap_err();
    assert!(matches!(err, PipelineError::ParseError(_)), "got {:?}", err);
}

#[test]
fn empty_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "empty.csv", "");
    assert!(matches!(
        read_csv(&path).unwrap_err(),
        PipelineError::ParseError(_)
    ));
}

#[test]
fn custom_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "data.tsv", "x\ty\n1\t0\n2\t1\n");
    let dataset = read_csv_with_config(&path, &CsvReaderConfig { delimiter: b'\t' }).unwrap();
    assert_eq!(dataset.ncols(), 2);
    assert_eq!(dataset.nrows(), 2);
}
