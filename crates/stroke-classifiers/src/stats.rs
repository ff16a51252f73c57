//! Evaluation metrics for binary classification.
//!
//! Positive class is `1`. Ratio metrics whose denominator is zero are
//! reported as `0.0`. Curves group tied scores into a single threshold.
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::Predictions;

/// Scalar metrics of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
}

impl Metrics {
    /// Metric names and values in reporting order.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
            ("roc_auc", self.roc_auc),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut matrix = Self::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth, pred) {
                (1, 1) => matrix.tp += 1,
                (1, _) => matrix.fn_ += 1,
                (_, 1) => matrix.fp += 1,
                _ => matrix.tn += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Rows are the true class, columns the predicted class.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Descending; the first threshold is `+inf` and maps to (0, 0).
    pub thresholds: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallCurve {
    /// Ordered by increasing threshold, ending with precision 1.
    pub precision: Vec<f64>,
    /// Ordered by increasing threshold, ending with recall 0.
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Cumulative false/true positive counts at each distinct score, scores
/// visited in descending order.
fn binary_clf_counts(y_true: &[u8], scores: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0.0f64, 0.0f64);
    for (k, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_group = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_group {
            fps.push(fp);
            tps.push(tp);
            thresholds.push(scores[i]);
        }
    }
    (fps, tps, thresholds)
}

fn check_lengths(y_true: &[u8], scores: &[f64]) -> Result<()> {
    if y_true.len() != scores.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: y_true.len(),
            found: scores.len(),
        });
    }
    Ok(())
}

fn check_both_classes(y_true: &[u8]) -> Result<()> {
    let positives = y_true.iter().filter(|&&v| v == 1).count();
    if positives == 0 || positives == y_true.len() {
        log::error!("Only one class present in the true labels; ROC-AUC is undefined");
        return Err(PipelineError::DegenerateLabelSet);
    }
    Ok(())
}

/// Receiver operating characteristic curve.
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Result<RocCurve> {
    check_lengths(y_true, scores)?;
    check_both_classes(y_true)?;
    let (fps, tps, mut thresholds) = binary_clf_counts(y_true, scores);
    let total_fp = *fps.last().unwrap_or(&0.0);
    let total_tp = *tps.last().unwrap_or(&0.0);

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    fpr.extend(fps.iter().map(|f| f / total_fp));
    tpr.extend(tps.iter().map(|t| t / total_tp));
    thresholds.insert(0, f64::INFINITY);
    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
    })
}

/// Trapezoidal area under a curve given by increasing `x`.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Area under the ROC curve. Requires both classes in `y_true`.
pub fn roc_auc_score(y_true: &[u8], scores: &[f64]) -> Result<f64> {
    let curve = roc_curve(y_true, scores)?;
    Ok(auc(&curve.fpr, &curve.tpr))
}

/// Precision and recall at every distinct score threshold.
pub fn precision_recall_curve(y_true: &[u8], scores: &[f64]) -> Result<PrecisionRecallCurve> {
    check_lengths(y_true, scores)?;
    if !y_true.iter().any(|&v| v == 1) {
        return Err(PipelineError::DegenerateLabelSet);
    }
    let (fps, tps, thresholds) = binary_clf_counts(y_true, scores);
    let total_tp = *tps.last().unwrap_or(&0.0);

    let mut precision: Vec<f64> = tps
        .iter()
        .zip(&fps)
        .map(|(tp, fp)| if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) })
        .collect();
    let mut recall: Vec<f64> = tps.iter().map(|tp| tp / total_tp).collect();
    let mut thresholds = thresholds;

    precision.reverse();
    recall.reverse();
    thresholds.reverse();
    precision.push(1.0);
    recall.push(0.0);

    Ok(PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Compute the metrics report for a prediction set.
pub fn evaluate(y_true: &[u8], predictions: &Predictions) -> Result<Metrics> {
    if predictions.is_empty() || predictions.probabilities.is_empty() {
        log::error!("No predictions to evaluate; run predict() first");
        return Err(PipelineError::NoPredictions);
    }
    check_lengths(y_true, &predictions.probabilities)?;
    if predictions.labels.len() != y_true.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: y_true.len(),
            found: predictions.labels.len(),
        });
    }

    let cm = ConfusionMatrix::from_labels(y_true, &predictions.labels);
    let roc_auc = roc_auc_score(y_true, &predictions.probabilities)?;
    let metrics = Metrics {
        accuracy: cm.accuracy(),
        precision: cm.precision(),
        recall: cm.recall(),
        f1: cm.f1(),
        roc_auc,
    };
    log::info!("Model evaluation done");
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_of_perfect_and_inverted_ranking() {
        let y = [0u8, 0, 1, 1];
        assert_eq!(roc_auc_score(&y, &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0);
        assert_eq!(roc_auc_score(&y, &[0.9, 0.8, 0.2, 0.1]).unwrap(), 0.0);
    }

    #[test]
    fn tied_scores_count_half() {
        let y = [0u8, 1];
        assert_eq!(roc_auc_score(&y, &[0.5, 0.5]).unwrap(), 0.5);
    }

    #[test]
    fn roc_starts_at_origin_and_ends_at_one() {
        let curve = roc_curve(&[0, 1, 0, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert_eq!((curve.fpr[0], curve.tpr[0]), (0.0, 0.0));
        assert_eq!(curve.fpr.last(), Some(&1.0));
        assert_eq!(curve.tpr.last(), Some(&1.0));
        assert!(curve.thresholds[0].is_infinite());
    }
}
