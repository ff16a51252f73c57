use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Top-level configuration for a full pipeline run.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub target_column: String,
    pub preprocess: PreprocessConfig,
    pub split: SplitConfig,
    pub model: ModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/healthcare-dataset-stroke-data.csv"),
            target_column: "stroke".to_string(),
            preprocess: PreprocessConfig::default(),
            split: SplitConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "target_column must not be empty".to_string(),
            ));
        }
        self.split.validate()?;
        self.model.validate()
    }
}

/// What to do with missing values in non-numeric columns.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalMissing {
    /// Leave them in place and emit a diagnostic; encoded rows get all-zero indicators.
    #[default]
    Ignore,
    /// Fill with the most frequent category (ties go to the smallest name).
    MostFrequent,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Field delimiter of the input file.
    pub delimiter: char,
    /// Columns dropped right after loading.
    pub ignore_columns: Vec<String>,
    pub categorical_missing: CategoricalMissing,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            ignore_columns: Vec::new(),
            categorical_missing: CategoricalMissing::Ignore,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows that go to the test subset.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

/// Optimization algorithm used to fit the logistic regression.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    #[default]
    CoordinateDescent,
    ProximalGradient,
}

/// Regularization applied to the coefficients (never to the intercept).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    #[default]
    L1,
    L2,
    ElasticNet,
    None,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    Uniform,
    /// Weight each class by `n_samples / (2 * n_class)`.
    #[default]
    Balanced,
}

/// Hyper-parameters of the logistic regression classifier.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub solver: Solver,
    pub penalty: Penalty,
    /// Share of the L1 term when `penalty` is `elastic_net`.
    pub l1_ratio: f64,
    /// Inverse regularization strength.
    pub c: f64,
    pub class_weight: ClassWeight,
    pub seed: u64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            solver: Solver::CoordinateDescent,
            penalty: Penalty::L1,
            l1_ratio: 0.5,
            c: 1.0,
            class_weight: ClassWeight::Balanced,
            seed: 42,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(PipelineError::InvalidConfig(format!(
                "C must be a positive finite number, got {}",
                self.c
            )));
        }
        if !(self.tol > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        if self.max_iter == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.l1_ratio) {
            return Err(PipelineError::InvalidConfig(format!(
                "l1_ratio must be in [0, 1], got {}",
                self.l1_ratio
            )));
        }
        Ok(())
    }

    /// Weights `(alpha, beta)` of the L1 and squared-L2 terms.
    pub fn penalty_weights(&self) -> (f64, f64) {
        match self.penalty {
            Penalty::L1 => (1.0, 0.0),
            Penalty::L2 => (0.0, 1.0),
            Penalty::ElasticNet => (self.l1_ratio, 1.0 - self.l1_ratio),
            Penalty::None => (0.0, 0.0),
        }
    }
}

impl FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "coordinate_descent" | "cd" => Ok(Solver::CoordinateDescent),
            "proximal_gradient" | "fista" => Ok(Solver::ProximalGradient),
            _ => Err(format!(
                "Unknown solver: {}. Valid options are: coordinate_descent, proximal_gradient",
                s
            )),
        }
    }
}

impl FromStr for Penalty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "l1" => Ok(Penalty::L1),
            "l2" => Ok(Penalty::L2),
            "elastic_net" | "elasticnet" => Ok(Penalty::ElasticNet),
            "none" => Ok(Penalty::None),
            _ => Err(format!(
                "Unknown penalty: {}. Valid options are: l1, l2, elastic_net, none",
                s
            )),
        }
    }
}

impl FromStr for ClassWeight {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balanced" => Ok(ClassWeight::Balanced),
            "uniform" | "none" => Ok(ClassWeight::Uniform),
            _ => Err(format!(
                "Unknown class weight policy: {}. Valid options are: balanced, uniform",
                s
            )),
        }
    }
}
