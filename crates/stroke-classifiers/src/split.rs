//! Stratified train/test splitting.
//!
//! The split is reproducible for a given seed: every class's row indices are
//! shuffled with one seeded `StdRng` (classes in ascending label order), the
//! first `quota` rows of each class go to the test subset, and finally both
//! index lists are shuffled with the same generator.
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SplitConfig;
use crate::data_handling::{class_counts, Dataset, FeatureSet};
use crate::error::{PipelineError, Result};

/// Aligned train/test features and labels.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub feature_names: Vec<String>,
    /// Original row index of every train row.
    pub train_indices: Vec<usize>,
    /// Original row index of every test row.
    pub test_indices: Vec<usize>,
}

/// Separate `target` from the features and split with class stratification.
pub fn train_test_split(
    dataset: &Dataset,
    target: &str,
    config: &SplitConfig,
) -> Result<TrainTestSplit> {
    let features = dataset.to_feature_set(target)?;
    stratified_split(features, config)
}

/// Split a [`FeatureSet`] keeping the class ratio in both subsets.
pub fn stratified_split(features: FeatureSet, config: &SplitConfig) -> Result<TrainTestSplit> {
    config.validate()?;
    let n = features.nrows();
    let counts = features.class_counts();

    for (label, &count) in counts.iter().enumerate() {
        if count > 0 && count < 2 {
            log::error!(
                "Class {} has only {} member(s); stratified split is not possible",
                label,
                count
            );
            return Err(PipelineError::StratificationInfeasible {
                label: label as u8,
                count,
            });
        }
    }

    let n_classes = counts.iter().filter(|&&c| c > 0).count();
    let n_test = (config.test_size * n as f64).ceil() as usize;
    let n_train = n - n_test.min(n);
    if n_test < n_classes || n_train < n_classes {
        return Err(PipelineError::InvalidConfig(format!(
            "test_size {} gives {} test and {} train rows for {} classes; both need at least one row per class",
            config.test_size, n_test, n_train, n_classes
        )));
    }

    let quotas = allocate_test_quotas(&counts, n, n_test);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut train_indices = Vec::with_capacity(n_train);
    let mut test_indices = Vec::with_capacity(n_test);
    for label in 0..2u8 {
        let mut rows: Vec<usize> = features
            .y
            .iter()
            .enumerate()
            .filter(|&(_, &y)| y == label)
            .map(|(i, _)| i)
            .collect();
        rows.shuffle(&mut rng);
        let quota = quotas[label as usize];
        test_indices.extend_from_slice(&rows[..quota]);
        train_indices.extend_from_slice(&rows[quota..]);
    }
    train_indices.shuffle(&mut rng);
    test_indices.shuffle(&mut rng);

    let split = TrainTestSplit {
        x_train: features.x.select(Axis(0), &train_indices),
        x_test: features.x.select(Axis(0), &test_indices),
        y_train: train_indices.iter().map(|&i| features.y[i]).collect(),
        y_test: test_indices.iter().map(|&i| features.y[i]).collect(),
        feature_names: features.feature_names,
        train_indices,
        test_indices,
    };

    log::info!(
        "Data split into {} train and {} test rows (test class counts {:?})",
        split.y_train.len(),
        split.y_test.len(),
        class_counts(&split.y_test)
    );
    Ok(split)
}

/// Distribute `n_test` rows over classes proportionally to `counts`.
///
/// Each class first gets the floor of its share; leftover slots go to the
/// largest fractional remainders, ties to the lower label.
pub fn allocate_test_quotas(counts: &[usize; 2], n: usize, n_test: usize) -> [usize; 2] {
    let mut quotas = [0usize; 2];
    let mut remainders = [0.0f64; 2];
    for (label, &count) in counts.iter().enumerate() {
        let share = count as f64 * n_test as f64 / n as f64;
        quotas[label] = (share.floor() as usize).min(count);
        remainders[label] = share - share.floor();
    }

    let mut leftover = n_test - quotas.iter().sum::<usize>();
    let mut order = [0usize, 1usize];
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]).then(a.cmp(&b)));
    while leftover > 0 {
        let mut assigned = false;
        for &label in &order {
            if leftover == 0 {
                break;
            }
            if quotas[label] < counts[label] {
                quotas[label] += 1;
                leftover -= 1;
                assigned = true;
            }
        }
        if !assigned {
            break;
        }
    }
    quotas
}
