pub mod classifier_trait;
pub mod logistic;

pub use classifier_trait::{ClassifierModel, Predictions};
pub use logistic::LogisticRegression;
