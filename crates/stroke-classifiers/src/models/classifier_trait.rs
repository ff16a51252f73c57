use ndarray::Array2;

use crate::error::Result;

/// Predicted labels and positive-class probabilities, aligned row-for-row
/// with the input matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub labels: Vec<u8>,
    pub probabilities: Vec<f64>,
}

impl Predictions {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Contract shared by binary classifiers in this crate. Labels are 0/1 with
/// 1 as the positive class.
pub trait ClassifierModel {
    /// Fit the model in place.
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Probability of class 1 for every row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Labels and probabilities for every row.
    fn predict(&self, x: &Array2<f64>) -> Result<Predictions>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
