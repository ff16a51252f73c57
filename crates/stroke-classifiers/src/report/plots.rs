use plotly::common::{ColorScale, ColorScalePalette, DashType, Font, Line, Mode};
use plotly::layout::{Annotation, Axis, Layout};
use plotly::{HeatMap, Plot, Scatter};

use crate::stats::{ConfusionMatrix, PrecisionRecallCurve, RocCurve};

/// ROC curve with a dashed diagonal for a random classifier.
pub fn plot_roc_curve(curve: &RocCurve, roc_auc: f64, model_name: &str) -> Plot {
    let trace = Scatter::new(curve.fpr.clone(), curve.tpr.clone())
        .mode(Mode::Lines)
        .name(&format!("{} (AUC = {:.3})", model_name, roc_auc));

    let reference_line = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Random classifier")
        .line(Line::new().color("gray").dash(DashType::Dash));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.add_trace(reference_line);
    plot.set_layout(
        Layout::new()
            .title("ROC curve")
            .x_axis(Axis::new().title("False Positive Rate"))
            .y_axis(Axis::new().title("True Positive Rate")),
    );
    plot
}

/// Cell captions of the confusion matrix, laid out like [`ConfusionMatrix::as_rows`].
pub fn confusion_matrix_labels(cm: &ConfusionMatrix) -> [[String; 2]; 2] {
    let total = cm.total().max(1) as f64;
    let names = [["True Neg", "False Pos"], ["False Neg", "True Pos"]];
    let rows = cm.as_rows();
    let cell = |r: usize, c: usize| {
        format!(
            "{}<br>{}<br>{:.2}%",
            names[r][c],
            rows[r][c],
            rows[r][c] as f64 / total * 100.0
        )
    };
    [[cell(0, 0), cell(0, 1)], [cell(1, 0), cell(1, 1)]]
}

/// Confusion matrix heatmap annotated with counts and percentages.
pub fn plot_confusion_matrix(cm: &ConfusionMatrix) -> Plot {
    let rows = cm.as_rows();
    let z: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| row.iter().map(|&v| v as f64).collect())
        .collect();
    let heatmap = HeatMap::new_z(z).color_scale(ColorScale::Palette(ColorScalePalette::Blues));

    let labels = confusion_matrix_labels(cm);
    let max_count = rows.iter().flatten().copied().max().unwrap_or(0) as f64;
    let mut annotations = Vec::with_capacity(4);
    for (r, row) in labels.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            let dark_cell = rows[r][c] as f64 > max_count / 2.0;
            annotations.push(
                Annotation::new()
                    .x(c as f64)
                    .y(r as f64)
                    .text(text.as_str())
                    .show_arrow(false)
                    .font(Font::new().color(if dark_cell { "white" } else { "black" })),
            );
        }
    }

    let class_axis = |title: &str| {
        Axis::new()
            .title(title)
            .tick_values(vec![0.0, 1.0])
            .tick_text(vec!["0".to_string(), "1".to_string()])
    };

    let mut plot = Plot::new();
    plot.add_trace(heatmap);
    plot.set_layout(
        Layout::new()
            .title("Confusion matrix")
            .x_axis(class_axis("Predicted label"))
            .y_axis(class_axis("True label"))
            .annotations(annotations),
    );
    plot
}

pub fn plot_precision_recall_curve(curve: &PrecisionRecallCurve) -> Plot {
    let trace = Scatter::new(curve.recall.clone(), curve.precision.clone())
        .mode(Mode::Lines)
        .name("Precision-Recall");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title("Precision-Recall curve")
            .x_axis(Axis::new().title("Recall"))
            .y_axis(Axis::new().title("Precision")),
    );
    plot
}
