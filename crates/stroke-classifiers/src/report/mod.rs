//! Presentation of evaluation results: plotly figures and an HTML report.
pub mod plots;
pub mod report;

pub use report::{build_evaluation_report, Report, ReportSection};
