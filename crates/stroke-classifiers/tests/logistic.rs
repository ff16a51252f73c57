//! Behaviour of the logistic regression classifier and its two solvers.

mod common;

use ndarray::Array2;
use stroke_classifiers::config::{ClassWeight, ModelConfig, Penalty, PreprocessConfig, Solver};
use stroke_classifiers::error::PipelineError;
use stroke_classifiers::io::read_csv;
use stroke_classifiers::models::logistic::sample_weights;
use stroke_classifiers::models::{ClassifierModel, LogisticRegression};
use stroke_classifiers::preprocessing::{preprocess, scale_train_test};

use common::{health_records_csv, write_file};

/// 40 evenly spaced points on [-2, 2], positive when x > 0.
fn separable() -> (Array2<f64>, Vec<u8>) {
    let x = Array2::from_shape_fn((40, 1), |(i, _)| -2.0 + 4.0 * i as f64 / 39.0);
    let y = x.column(0).iter().map(|v| u8::from(*v > 0.0)).collect();
    (x, y)
}

/// Two features: a noisy signal in column 0 and a constant-ish
/// distractor in column 1. Labels of a few rows near the boundary are
/// flipped so the classes overlap.
fn overlapping() -> (Array2<f64>, Vec<u8>) {
    let n = 60;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let t = -3.0 + 6.0 * i as f64 / (n - 1) as f64;
        if j == 0 {
            t
        } else {
            ((i * 7) % 11) as f64 / 11.0 - 0.5
        }
    });
    let mut y: Vec<u8> = x.column(0).iter().map(|v| u8::from(*v > 0.0)).collect();
    for i in [25, 27, 33, 35] {
        y[i] = 1 - y[i];
    }
    (x, y)
}

/// Standardized features of the 200-row health-record fixture (16 columns
/// after encoding, including the singleton `gender_Other`).
fn health_records() -> (Array2<f64>, Vec<u8>, Vec<String>) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "records.csv", &health_records_csv());
    let dataset = preprocess(read_csv(&path).unwrap(), &PreprocessConfig::default(), "stroke")
        .unwrap();
    let features = dataset.to_feature_set("stroke").unwrap();
    let (_, x, _) = scale_train_test(&features.x, &features.x).unwrap();
    (x, features.y, features.feature_names)
}

/// Largest violation of the L1 optimality conditions at the fitted point:
/// `|g_j| <= 1` for zero weights, `g_j = -sign(w_j)` otherwise, and a zero
/// intercept gradient, where `g` is the gradient of the weighted log-loss.
fn l1_optimality_gap(model: &LogisticRegression, x: &Array2<f64>, y: &[u8]) -> f64 {
    let config = model.config();
    let fitted = model.coefficients().unwrap();
    let proba = model.predict_proba(x).unwrap();
    let residual: Vec<f64> = sample_weights(y, config.class_weight)
        .iter()
        .zip(&proba)
        .zip(y)
        .map(|((s, p), &t)| config.c * s * (p - f64::from(t)))
        .collect();

    let mut gap = residual.iter().sum::<f64>().abs();
    for (j, &w) in fitted.weights.iter().enumerate() {
        let g: f64 = x.column(j).iter().zip(&residual).map(|(v, r)| v * r).sum();
        let violation = if w == 0.0 {
            (g.abs() - 1.0).max(0.0)
        } else {
            (g + w.signum()).abs()
        };
        gap = gap.max(violation);
    }
    gap
}

fn config(solver: Solver, penalty: Penalty) -> ModelConfig {
    ModelConfig {
        solver,
        penalty,
        ..ModelConfig::default()
    }
}

#[test]
fn learns_a_separable_threshold() {
    let (x, y) = separable();
    let mut model = LogisticRegression::new(ModelConfig::default());
    model.fit(&x, &y).unwrap();
    assert!(model.is_fitted());

    let predictions = model.predict(&x).unwrap();
    assert_eq!(predictions.labels, y);
    assert!(model.coefficients().unwrap().weights[0] > 0.0);
}

#[test]
fn probabilities_are_in_unit_interval() {
    let (x, y) = overlapping();
    let mut model = LogisticRegression::new(ModelConfig::default());
    model.fit(&x, &y).unwrap();

    let proba = model.predict_proba(&x).unwrap();
    assert_eq!(proba.len(), 60);
    assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));

    let predictions = model.predict(&x).unwrap();
    assert_eq!(predictions.probabilities, proba);
    // scores increase with the signal feature
    assert!(proba[59] > proba[0]);
}

#[test]
fn fitting_is_deterministic_for_a_seed() {
    let (x, y) = overlapping();
    let mut a = LogisticRegression::new(ModelConfig::default());
    let mut b = LogisticRegression::new(ModelConfig::default());
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();
    assert_eq!(a.coefficients(), b.coefficients());
}

#[test]
fn strong_l1_penalty_zeroes_weights() {
    let (x, y) = separable();
    let mut model = LogisticRegression::new(ModelConfig {
        c: 0.01,
        ..ModelConfig::default()
    });
    model.fit(&x, &y).unwrap();
    let coefficients = model.coefficients().unwrap();
    assert_eq!(coefficients.non_zero(), 0);
}

#[test]
fn l1_drops_the_uninformative_feature_first() {
    let (x, y) = overlapping();
    let mut model = LogisticRegression::new(ModelConfig {
        c: 0.05,
        ..ModelConfig::default()
    });
    model.fit(&x, &y).unwrap();
    let weights = &model.coefficients().unwrap().weights;
    assert!(weights[0] > 0.0);
    assert_eq!(weights[1], 0.0);
}

#[test]
fn solvers_agree_on_a_strongly_convex_problem() {
    let (x, y) = overlapping();
    let precise = |solver| ModelConfig {
        max_iter: 20_000,
        tol: 1e-9,
        ..config(solver, Penalty::L2)
    };

    let mut cd = LogisticRegression::new(precise(Solver::CoordinateDescent));
    let mut pg = LogisticRegression::new(precise(Solver::ProximalGradient));
    cd.fit(&x, &y).unwrap();
    pg.fit(&x, &y).unwrap();

    let a = cd.coefficients().unwrap();
    let b = pg.coefficients().unwrap();
    for (wa, wb) in a.weights.iter().zip(&b.weights) {
        assert!((wa - wb).abs() < 1e-4, "{} vs {}", wa, wb);
    }
    assert!((a.intercept - b.intercept).abs() < 1e-4);
}

#[test]
fn default_l1_fit_reaches_the_optimum_on_health_records() {
    let (x, y, names) = health_records();
    assert_eq!(x.ncols(), 16);
    assert!(names.iter().any(|n| n == "gender_Other"));

    let mut model = LogisticRegression::new(ModelConfig {
        tol: 1e-8,
        max_iter: 20_000,
        ..ModelConfig::default()
    });
    model.fit(&x, &y).unwrap();

    let fitted = model.coefficients().unwrap();
    assert!(fitted.non_zero() > 0 && fitted.non_zero() < 16);
    let gap = l1_optimality_gap(&model, &x, &y);
    assert!(gap < 1e-4, "optimality gap {}", gap);
}

#[test]
fn solvers_agree_under_l1_penalty() {
    let (x, y, _) = health_records();
    let mut cd = LogisticRegression::new(ModelConfig {
        tol: 1e-8,
        max_iter: 20_000,
        ..config(Solver::CoordinateDescent, Penalty::L1)
    });
    let mut pg = LogisticRegression::new(ModelConfig {
        tol: 1e-10,
        max_iter: 50_000,
        ..config(Solver::ProximalGradient, Penalty::L1)
    });
    cd.fit(&x, &y).unwrap();
    pg.fit(&x, &y).unwrap();

    let a = cd.coefficients().unwrap();
    let b = pg.coefficients().unwrap();
    for (wa, wb) in a.weights.iter().zip(&b.weights) {
        assert!((wa - wb).abs() < 1e-4, "{} vs {}", wa, wb);
    }
    assert!((a.intercept - b.intercept).abs() < 1e-4);
    assert!(l1_optimality_gap(&pg, &x, &y) < 1e-4);
}

#[test]
fn default_settings_converge_on_health_records() {
    let (x, y, _) = health_records();
    let mut model = LogisticRegression::new(ModelConfig::default());
    model.fit(&x, &y).unwrap();
    assert!(model.coefficients().unwrap().n_iter < 100);
}

#[test]
fn proximal_gradient_with_l1_learns_the_signal() {
    let (x, y) = overlapping();
    let mut model = LogisticRegression::new(config(Solver::ProximalGradient, Penalty::L1));
    model.fit(&x, &y).unwrap();
    let predictions = model.predict(&x).unwrap();
    let correct = predictions
        .labels
        .iter()
        .zip(&y)
        .filter(|(p, t)| p == t)
        .count();
    assert!(correct >= 54, "only {} of 60 correct", correct);
}

#[test]
fn elastic_net_and_uniform_weights_fit() {
    let (x, y) = overlapping();
    let mut model = LogisticRegression::new(ModelConfig {
        penalty: Penalty::ElasticNet,
        class_weight: ClassWeight::Uniform,
        ..ModelConfig::default()
    });
    model.fit(&x, &y).unwrap();
    assert!(model.coefficients().unwrap().weights[0] > 0.0);
}

#[test]
fn predicting_before_fit_is_not_trained() {
    let model = LogisticRegression::new(ModelConfig::default());
    let x = Array2::<f64>::zeros((2, 1));
    assert_eq!(model.predict(&x).unwrap_err(), PipelineError::NotTrained);
    assert_eq!(model.predict_proba(&x).unwrap_err(), PipelineError::NotTrained);
}

#[test]
fn predicting_with_wrong_width_fails() {
    let (x, y) = separable();
    let mut model = LogisticRegression::new(ModelConfig::default());
    model.fit(&x, &y).unwrap();
    let wide = Array2::<f64>::zeros((3, 4));
    assert_eq!(
        model.predict(&wide).unwrap_err(),
        PipelineError::ShapeMismatch {
            expected: 1,
            found: 4
        }
    );
}

#[test]
fn nan_features_fail_to_fit() {
    let (mut x, y) = separable();
    x[(5, 0)] = f64::NAN;
    let mut model = LogisticRegression::new(ModelConfig::default());
    assert!(matches!(
        model.fit(&x, &y).unwrap_err(),
        PipelineError::FitError(_)
    ));
    assert!(!model.is_fitted());
}

#[test]
fn single_class_fails_to_fit() {
    let (x, _) = separable();
    let y = vec![0u8; 40];
    let mut model = LogisticRegression::new(ModelConfig::default());
    assert!(matches!(
        model.fit(&x, &y).unwrap_err(),
        PipelineError::FitError(_)
    ));
}

#[test]
fn unpenalized_separable_data_does_not_converge() {
    let (x, y) = separable();
    let mut model = LogisticRegression::new(ModelConfig {
        penalty: Penalty::None,
        max_iter: 50,
        ..ModelConfig::default()
    });
    assert!(matches!(
        model.fit(&x, &y).unwrap_err(),
        PipelineError::FitError(_)
    ));
}

#[test]
fn invalid_hyper_parameters_are_rejected() {
    let (x, y) = separable();
    let mut model = LogisticRegression::new(ModelConfig {
        c: 0.0,
        ..ModelConfig::default()
    });
    assert!(matches!(
        model.fit(&x, &y).unwrap_err(),
        PipelineError::InvalidConfig(_)
    ));
}
