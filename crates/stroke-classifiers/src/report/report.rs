use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::config::PipelineConfig;
use crate::pipeline::PipelineOutcome;
use crate::report::plots::{plot_confusion_matrix, plot_precision_recall_curve, plot_roc_curve};
use crate::stats::{precision_recall_curve, roc_curve};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
header { border-bottom: 2px solid #1f77b4; margin-bottom: 1.5em; }
section { margin-bottom: 2.5em; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: 4px 12px; text-align: left; }
.code-container { background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto; font-family: monospace; white-space: pre-wrap; }
";

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    items: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            items: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.items.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.items.push(PreEscaped(plot.to_inline_html(None)));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for item in &self.items {
                    div { (item) }
                }
            }
        }
    }
}

/// Standalone HTML report.
pub struct Report {
    name: String,
    version: String,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(name: &str, version: &str, title: &str) -> Self {
        Report {
            name: name.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    header {
                        h1 { (self.title) }
                        p { (self.name) " " (self.version) " | generated " (generated) }
                    }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
        .into_string()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

/// Assemble the evaluation report: metrics, the three diagnostic plots,
/// coefficients and the run configuration.
pub fn build_evaluation_report(outcome: &PipelineOutcome, config: &PipelineConfig) -> Result<Report> {
    let mut report = Report::new(
        "stroke-classifiers",
        env!("CARGO_PKG_VERSION"),
        "Stroke prediction: logistic regression evaluation",
    );

    let mut metrics_section = ReportSection::new("Metrics");
    metrics_section.add_content(html! {
        p {
            (outcome.y_test.len()) " test rows, "
            (outcome.train_rows) " train rows, "
            (outcome.feature_names.len()) " features."
        }
        table {
            tr { th { "Metric" } th { "Value" } }
            @for (name, value) in outcome.metrics.entries() {
                tr { td { (name) } td { (format!("{:.4}", value)) } }
            }
        }
    });
    report.add_section(metrics_section);

    let roc = roc_curve(&outcome.y_test, &outcome.predictions.probabilities)
        .context("Failed to compute ROC curve")?;
    let pr = precision_recall_curve(&outcome.y_test, &outcome.predictions.probabilities)
        .context("Failed to compute precision-recall curve")?;

    let mut plots_section = ReportSection::new("Diagnostics");
    plots_section.add_plot(plot_roc_curve(&roc, outcome.metrics.roc_auc, &outcome.model_name));
    plots_section.add_plot(plot_confusion_matrix(&outcome.confusion_matrix));
    plots_section.add_plot(plot_precision_recall_curve(&pr));
    report.add_section(plots_section);

    let mut coef_section = ReportSection::new("Coefficients");
    coef_section.add_content(html! {
        p { "Intercept: " (format!("{:.6}", outcome.coefficients.intercept))
            ", solver iterations: " (outcome.coefficients.n_iter) }
        table {
            tr { th { "Feature" } th { "Coefficient" } }
            @for (name, weight) in outcome.feature_names.iter().zip(&outcome.coefficients.weights) {
                tr { td { (name) } td { (format!("{:.6}", weight)) } }
            }
        }
    });
    report.add_section(coef_section);

    let mut config_section = ReportSection::new("Configuration");
    config_section.add_content(html! {
        div class="code-container" {
            pre {
                code { (serde_json::to_string_pretty(config)?) }
            }
        }
    });
    report.add_section(config_section);

    Ok(report)
}
