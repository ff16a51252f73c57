//! Regularized binary logistic regression.
//!
//! Minimizes
//!
//! ```text
//! C * sum_i s_i * logloss(y_i, w.x_i + b) + alpha * |w|_1 + beta / 2 * |w|_2^2
//! ```
//!
//! where `s_i` are the class weights and `(alpha, beta)` come from the
//! configured penalty. The intercept `b` is never penalized. Two solvers are
//! available: cyclic coordinate descent with Newton steps and soft
//! thresholding (coordinate order reshuffled from a seeded RNG every sweep),
//! and accelerated proximal gradient (FISTA) with backtracking.
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{ClassWeight, ModelConfig, Solver};
use crate::data_handling::class_counts;
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::{ClassifierModel, Predictions};

const MIN_CURVATURE: f64 = 1e-12;
const ARMIJO_SIGMA: f64 = 0.01;
const MAX_LINE_SEARCH: usize = 30;
const MAX_BACKTRACKS: usize = 60;
/// Relative slack for line-search comparisons near the optimum, where
/// objective differences fall below rounding noise.
const ROUNDING_SLACK: f64 = 1e-12;

/// Parameters of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCoefficients {
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Solver iterations (sweeps for coordinate descent) until convergence.
    pub n_iter: usize,
}

impl FittedCoefficients {
    pub fn non_zero(&self) -> usize {
        self.weights.iter().filter(|w| **w != 0.0).count()
    }
}

/// Logistic regression classifier
pub struct LogisticRegression {
    config: ModelConfig,
    fitted: Option<FittedCoefficients>,
}

impl LogisticRegression {
    pub fn new(config: ModelConfig) -> Self {
        LogisticRegression {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn coefficients(&self) -> Option<&FittedCoefficients> {
        self.fitted.as_ref()
    }

    /// Raw margins `w.x + b` for every row.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            log::error!("Model is not trained; cannot predict");
            PipelineError::NotTrained
        })?;
        if x.ncols() != fitted.weights.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: fitted.weights.len(),
                found: x.ncols(),
            });
        }
        let w = Array1::from(fitted.weights.clone());
        Ok(x.dot(&w).iter().map(|z| z + fitted.intercept).collect())
    }
}

impl ClassifierModel for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        self.config.validate()?;
        validate_training_data(x, y)?;

        let sample_weights: Vec<f64> = sample_weights(y, self.config.class_weight)
            .into_iter()
            .map(|s| s * self.config.c)
            .collect();
        let (alpha, beta) = self.config.penalty_weights();
        let problem = Problem {
            x,
            y,
            sample_weights,
            alpha,
            beta,
        };

        log::debug!(
            "Fitting logistic regression: solver {:?}, penalty {:?}, C {}, class weight {:?}",
            self.config.solver,
            self.config.penalty,
            self.config.c,
            self.config.class_weight
        );
        let fitted = match self.config.solver {
            Solver::CoordinateDescent => {
                fit_coordinate_descent(&problem, self.config.max_iter, self.config.tol, self.config.seed)
            }
            Solver::ProximalGradient => {
                fit_proximal_gradient(&problem, self.config.max_iter, self.config.tol)
            }
        }
        .map_err(|e| {
            log::error!("Error while training the model: {}", e);
            e
        })?;

        log::info!(
            "Model trained in {} iterations ({} of {} coefficients non-zero)",
            fitted.n_iter,
            fitted.non_zero(),
            fitted.weights.len()
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(sigmoid)
            .collect())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Predictions> {
        let margins = self.decision_function(x)?;
        let labels = margins.iter().map(|&z| u8::from(z > 0.0)).collect();
        let probabilities = margins.into_iter().map(sigmoid).collect();
        Ok(Predictions {
            labels,
            probabilities,
        })
    }

    fn name(&self) -> &str {
        "Logistic regression"
    }
}

/// Per-sample weights for the given policy. `Balanced` gives every sample
/// of class `k` the weight `n / (2 * n_k)`.
pub fn sample_weights(y: &[u8], policy: ClassWeight) -> Vec<f64> {
    match policy {
        ClassWeight::Uniform => vec![1.0; y.len()],
        ClassWeight::Balanced => {
            let counts = class_counts(y);
            let n = y.len() as f64;
            let class_weight = |count: usize| {
                if count == 0 {
                    0.0
                } else {
                    n / (2.0 * count as f64)
                }
            };
            let weights = [class_weight(counts[0]), class_weight(counts[1])];
            y.iter().map(|&label| weights[label as usize]).collect()
        }
    }
}

pub fn sigmoid(value: f64) -> f64 {
    if value >= 0.0 {
        let z = (-value).exp();
        1.0 / (1.0 + z)
    } else {
        let z = value.exp();
        z / (1.0 + z)
    }
}

/// `log(1 + exp(z)) - y * z`, the negative log-likelihood of label `y`.
fn log_loss(y: u8, z: f64) -> f64 {
    let softplus = if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    };
    softplus - f64::from(y) * z
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

fn validate_training_data(x: &Array2<f64>, y: &[u8]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if y.is_empty() {
        return Err(PipelineError::FitError("training set is empty".to_string()));
    }
    if let Some(bad) = y.iter().find(|&&v| v > 1) {
        return Err(PipelineError::InvalidLabels(format!(
            "expected labels 0 or 1, found {}",
            bad
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::FitError(
            "input contains NaN or infinite values".to_string(),
        ));
    }
    let counts = class_counts(y);
    if counts[0] == 0 || counts[1] == 0 {
        return Err(PipelineError::FitError(
            "training labels contain a single class".to_string(),
        ));
    }
    Ok(())
}

struct Problem<'a> {
    x: &'a Array2<f64>,
    y: &'a [u8],
    /// Class weights already multiplied by `C`.
    sample_weights: Vec<f64>,
    alpha: f64,
    beta: f64,
}

impl Problem<'_> {
    fn weighted_loss(&self, margins: &[f64]) -> f64 {
        margins
            .iter()
            .zip(self.y)
            .zip(&self.sample_weights)
            .map(|((&z, &y), &s)| s * log_loss(y, z))
            .sum()
    }

    fn margins(&self, w: &[f64], b: f64) -> Vec<f64> {
        let w = ArrayView1::from(w);
        self.x.dot(&w).iter().map(|z| z + b).collect()
    }
}

/// Newton direction for one coordinate of `g*d + h/2*d^2 + alpha*|w + d|`.
fn newton_direction(g: f64, h: f64, w: f64, alpha: f64) -> f64 {
    if g + alpha <= h * w {
        -(g + alpha) / h
    } else if g - alpha >= h * w {
        -(g - alpha) / h
    } else {
        -w
    }
}

/// Armijo backtracking along a fixed direction: halve the step until
/// `value(step) - base <= sigma * step * expected`. `None` when no step is
/// accepted.
fn armijo_step(base: f64, expected: f64, mut value: impl FnMut(f64) -> f64) -> Option<f64> {
    let slack = ROUNDING_SLACK * base.abs().max(1.0);
    let mut step = 1.0f64;
    for _ in 0..MAX_LINE_SEARCH {
        if value(step) - base <= ARMIJO_SIGMA * step * expected + slack {
            return Some(step);
        }
        step *= 0.5;
    }
    None
}

/// Progress of one coordinate descent sweep.
#[derive(Debug, Default)]
struct Sweep {
    max_step: f64,
    /// Coordinates whose line search accepted no step.
    stalled: usize,
}

impl Sweep {
    fn record(&mut self, delta: f64) {
        self.max_step = self.max_step.max(delta.abs());
    }

    fn stall(&mut self, direction: f64) {
        self.stalled += 1;
        self.max_step = self.max_step.max(direction.abs());
    }

    /// A sweep with a stalled coordinate never counts as converged.
    fn converged(&self, tol: f64) -> bool {
        self.stalled == 0 && self.max_step < tol
    }
}

fn fit_coordinate_descent(
    problem: &Problem,
    max_iter: usize,
    tol: f64,
    seed: u64,
) -> Result<FittedCoefficients> {
    let (n, d) = problem.x.dim();
    let mut w = vec![0.0f64; d];
    let mut b = 0.0f64;
    let mut z = vec![0.0f64; n];
    let mut rng = StdRng::seed_from_u64(seed);
    // Index `d` stands for the intercept.
    let mut order: Vec<usize> = (0..=d).collect();

    for iter in 1..=max_iter {
        order.shuffle(&mut rng);
        let mut sweep = Sweep::default();

        for &j in &order {
            let column = (j < d).then(|| problem.x.column(j));
            let value_at = |i: usize| column.as_ref().map_or(1.0, |c| c[i]);
            let (alpha, beta, current) = if j < d {
                (problem.alpha, problem.beta, w[j])
            } else {
                (0.0, 0.0, b)
            };

            let mut g = beta * current;
            let mut h = beta;
            for i in 0..n {
                let p = sigmoid(z[i]);
                let v = value_at(i);
                let s = problem.sample_weights[i];
                g += s * (p - f64::from(problem.y[i])) * v;
                h += s * p * (1.0 - p) * v * v;
            }
            let h = h.max(MIN_CURVATURE);

            let direction = newton_direction(g, h, current, alpha);
            if direction == 0.0 {
                continue;
            }

            let penalty = |v: f64| alpha * v.abs() + 0.5 * beta * v * v;
            let base = problem.weighted_loss(&z) + penalty(current);
            let expected =
                g * direction + alpha * ((current + direction).abs() - current.abs());

            let step = armijo_step(base, expected, |step| {
                let delta = step * direction;
                let trial: Vec<f64> = (0..n).map(|i| z[i] + delta * value_at(i)).collect();
                problem.weighted_loss(&trial) + penalty(current + delta)
            });
            let Some(step) = step else {
                log::debug!(
                    "line search stalled on coordinate {} (direction {:.3e})",
                    j,
                    direction
                );
                sweep.stall(direction);
                continue;
            };

            let delta = step * direction;
            for (i, zi) in z.iter_mut().enumerate() {
                *zi += delta * value_at(i);
            }
            if j < d {
                w[j] += delta;
            } else {
                b += delta;
            }
            sweep.record(delta);
        }

        let objective = problem.weighted_loss(&z)
            + w.iter()
                .map(|v| problem.alpha * v.abs() + 0.5 * problem.beta * v * v)
                .sum::<f64>();
        if !objective.is_finite() {
            return Err(PipelineError::FitError(format!(
                "objective became non-finite at iteration {}",
                iter
            )));
        }
        log::trace!(
            "coordinate descent sweep {}: objective {:.6}, max step {:.3e}, {} stalled",
            iter,
            objective,
            sweep.max_step,
            sweep.stalled
        );

        if sweep.converged(tol) {
            return Ok(FittedCoefficients {
                weights: w,
                intercept: b,
                n_iter: iter,
            });
        }
    }

    Err(PipelineError::FitError(format!(
        "coordinate descent did not converge in {} iterations",
        max_iter
    )))
}

fn fit_proximal_gradient(problem: &Problem, max_iter: usize, tol: f64) -> Result<FittedCoefficients> {
    let d = problem.x.ncols();

    // Smooth part and its gradient; the last entry of `theta` is the intercept.
    let smooth = |theta: &[f64]| -> (f64, Vec<f64>) {
        let z = problem.margins(&theta[..d], theta[d]);
        let mut value = problem.weighted_loss(&z);
        let residual: Vec<f64> = z
            .iter()
            .zip(problem.y)
            .zip(&problem.sample_weights)
            .map(|((&zi, &yi), &s)| s * (sigmoid(zi) - f64::from(yi)))
            .collect();
        let residual = Array1::from(residual);
        let mut grad: Vec<f64> = problem.x.t().dot(&residual).to_vec();
        for (g, w) in grad.iter_mut().zip(&theta[..d]) {
            *g += problem.beta * w;
        }
        value += 0.5 * problem.beta * theta[..d].iter().map(|w| w * w).sum::<f64>();
        grad.push(residual.sum());
        (value, grad)
    };
    let smooth_value = |theta: &[f64]| -> f64 {
        let z = problem.margins(&theta[..d], theta[d]);
        problem.weighted_loss(&z) + 0.5 * problem.beta * theta[..d].iter().map(|w| w * w).sum::<f64>()
    };
    let l1 = |theta: &[f64]| problem.alpha * theta[..d].iter().map(|w| w.abs()).sum::<f64>();

    let mut theta = vec![0.0f64; d + 1];
    let mut momentum_point = theta.clone();
    let mut t = 1.0f64;
    let mut step = 1.0f64;

    let (initial_value, initial_grad) = smooth(&theta);
    let grad_scale = initial_grad.iter().fold(1.0f64, |acc, g| acc.max(g.abs()));
    let mut previous_objective = initial_value + l1(&theta);

    for iter in 1..=max_iter {
        let (value, grad) = smooth(&momentum_point);

        let mut candidate;
        let mut candidate_value;
        let mut searches = 0;
        loop {
            candidate = momentum_point
                .iter()
                .zip(&grad)
                .enumerate()
                .map(|(j, (&p, &g))| {
                    let v = p - step * g;
                    if j < d {
                        soft_threshold(v, step * problem.alpha)
                    } else {
                        v
                    }
                })
                .collect::<Vec<f64>>();
            candidate_value = smooth_value(&candidate);
            let diff: Vec<f64> = candidate
                .iter()
                .zip(&momentum_point)
                .map(|(c, p)| c - p)
                .collect();
            let linear: f64 = diff.iter().zip(&grad).map(|(a, g)| a * g).sum();
            let quadratic: f64 = diff.iter().map(|a| a * a).sum::<f64>() / (2.0 * step);
            searches += 1;
            let slack = ROUNDING_SLACK * value.abs().max(1.0);
            if candidate_value <= value + linear + quadratic + slack || searches >= MAX_BACKTRACKS {
                break;
            }
            step *= 0.5;
        }

        let objective = candidate_value + l1(&candidate);
        if !objective.is_finite() {
            return Err(PipelineError::FitError(format!(
                "objective became non-finite at iteration {}",
                iter
            )));
        }

        let residual = candidate
            .iter()
            .zip(&momentum_point)
            .map(|(c, p)| ((p - c) / step).abs())
            .fold(0.0f64, f64::max);

        let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
        if objective > previous_objective {
            // Restart the momentum when the objective goes up.
            t = 1.0;
            momentum_point = candidate.clone();
        } else {
            let ratio = (t - 1.0) / t_next;
            momentum_point = candidate
                .iter()
                .zip(&theta)
                .map(|(c, old)| c + ratio * (c - old))
                .collect();
            t = t_next;
        }
        theta = candidate;
        previous_objective = objective;

        log::trace!(
            "proximal gradient iteration {}: objective {:.6}, residual {:.3e}, step {:.3e}",
            iter,
            objective,
            residual,
            step
        );

        if residual <= tol * grad_scale {
            let intercept = theta[d];
            theta.truncate(d);
            return Ok(FittedCoefficients {
                weights: theta,
                intercept,
                n_iter: iter,
            });
        }
    }

    Err(PipelineError::FitError(format!(
        "proximal gradient did not converge in {} iterations",
        max_iter
    )))
}
