//! stroke-classifiers: a small tabular binary-classification pipeline.
//!
//! The crate loads a delimited table, imputes and one-hot encodes it, makes a
//! stratified train/test split, standardizes features, fits a regularized
//! logistic regression and evaluates it. Each stage is a plain function (or a
//! fitted value) that takes the previous stage's output, so there is no
//! hidden call-order state; failures come back as [`error::PipelineError`].
//!
//! Plotting and the HTML report live in [`report`] and only consume the
//! evaluator's outputs.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod split;
pub mod stats;
