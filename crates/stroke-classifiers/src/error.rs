use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Failure kinds of the individual pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    FileNotFound(PathBuf),
    ParseError(String),
    /// Preprocessing was handed a dataset without columns or rows.
    NotLoaded,
    ColumnNotFound(String),
    /// A class has fewer than two members (label, count).
    StratificationInfeasible { label: u8, count: usize },
    InvalidConfig(String),
    InvalidLabels(String),
    ShapeMismatch { expected: usize, found: usize },
    /// The scaler was fitted or applied on an empty train subset.
    NotSplit,
    NotTrained,
    FitError(String),
    NoPredictions,
    /// ROC-AUC needs both classes in the true labels.
    DegenerateLabelSet,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::FileNotFound(path) => {
                write!(f, "File not found: {}", path.display())
            }
            PipelineError::ParseError(msg) => write!(f, "Failed to parse data: {}", msg),
            PipelineError::NotLoaded => {
                write!(f, "Dataset is empty; load data before preprocessing")
            }
            PipelineError::ColumnNotFound(name) => write!(f, "Column '{}' not found", name),
            PipelineError::StratificationInfeasible { label, count } => write!(
                f,
                "Cannot stratify: class {} has {} member(s), at least 2 are required",
                label, count
            ),
            PipelineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PipelineError::InvalidLabels(msg) => write!(f, "Invalid labels: {}", msg),
            PipelineError::ShapeMismatch { expected, found } => {
                write!(f, "Shape mismatch: expected {}, found {}", expected, found)
            }
            PipelineError::NotSplit => {
                write!(f, "Train subset is empty; split the data before scaling")
            }
            PipelineError::NotTrained => write!(f, "Model is not trained; call fit() first"),
            PipelineError::FitError(msg) => write!(f, "Model fit failed: {}", msg),
            PipelineError::NoPredictions => {
                write!(f, "No predictions available; run predict() first")
            }
            PipelineError::DegenerateLabelSet => write!(
                f,
                "ROC-AUC is undefined: only one class is present in the true labels"
            ),
        }
    }
}

impl Error for PipelineError {}

pub type Result<T> = std::result::Result<T, PipelineError>;
