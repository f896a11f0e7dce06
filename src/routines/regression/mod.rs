//! Regression of the document outcomes on the topic proportions
//!
//! Each [LinkType] maps the bias-augmented topic proportions of a document to a predicted outcome, fits the
//! regression weights `v`, and contributes the outcome term of the likelihood gradient with respect to `theta`.

use crate::structs::parameters::Hyperparameters;
use eyre::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod linear;
pub mod quadratic;
pub mod ridge;
pub mod sigmoid;

pub use linear::Linear;
pub use quadratic::Quadratic;
pub use sigmoid::Sigmoid;

/// The available link functions between topic proportions and outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Linear,
    Quadratic,
    Sigmoid,
}

impl LinkType {
    /// Returns the implementation of this link function
    pub fn link(&self) -> Box<dyn Link> {
        match self {
            LinkType::Linear => Box::new(Linear),
            LinkType::Quadratic => Box::new(Quadratic),
            LinkType::Sigmoid => Box::new(Sigmoid),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Linear => write!(f, "linear"),
            LinkType::Quadratic => write!(f, "quadratic"),
            LinkType::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

/// Input to [Link::fit_weights]
#[derive(Debug, Clone)]
pub struct Regression<'a> {
    /// The design, `theta` with a trailing column of ones (N×(K+1))
    pub theta_with_bias: ArrayView2<'a, f64>,
    pub outcomes: ArrayView1<'a, f64>,
    pub hyper: Hyperparameters,
    /// Weights from the previous iteration, if any
    pub previous: Option<ArrayView1<'a, f64>>,
    /// Number of sweeps for iterative fits
    pub max_iterations: usize,
    /// Step size for iterative fits
    pub learning_rate: f64,
}

/// Everything needed to evaluate the partial derivative of the likelihood with respect to `theta[d, k]`
#[derive(Debug, Clone, Copy)]
pub struct GradientPoint {
    /// The word reconstruction term, `((1 - λ) / T) · e_dk / theta_dk`
    pub word_term: f64,
    pub lambda: f64,
    /// Number of documents, `N`
    pub ndocs: f64,
    /// The observed outcome `c_d`
    pub outcome: f64,
    /// The current prediction for document `d`
    pub prediction: f64,
    /// `theta[d, k]`
    pub theta: f64,
    /// `v[k]`
    pub weight: f64,
    /// Whether the run is fitting the model, rather than evaluating it
    pub training: bool,
}

/// A link function between the topic proportions of a document and its outcome
pub trait Link: fmt::Debug {
    fn link_type(&self) -> LinkType;

    /// Predicted outcome for a single row of `theta_with_bias`
    fn predict(&self, theta_with_bias: ArrayView1<f64>, v: ArrayView1<f64>) -> f64;

    /// Partial derivative of the joint likelihood with respect to `theta[d, k]`
    fn gradient_wrt_theta(&self, point: &GradientPoint) -> f64;

    /// Fit the regression weights, returning a vector of length K+1
    fn fit_weights(&self, problem: &Regression) -> Result<Array1<f64>>;

    /// Predicted outcomes for every document
    fn predictions(&self, theta_with_bias: ArrayView2<f64>, v: ArrayView1<f64>) -> Array1<f64> {
        theta_with_bias
            .rows()
            .into_iter()
            .map(|row| self.predict(row, v))
            .collect()
    }
}

pub fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_dispatch() {
        for link in [LinkType::Linear, LinkType::Quadratic, LinkType::Sigmoid] {
            assert_eq!(link.link().link_type(), link);
        }
    }

    #[test]
    fn test_link_names() {
        let link: LinkType = serde_json::from_str("\"sigmoid\"").unwrap();
        assert_eq!(link, LinkType::Sigmoid);
        assert_eq!(LinkType::Quadratic.to_string(), "quadratic");
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999);
        assert!(sigmoid(-40.0) < 0.001);
    }
}
