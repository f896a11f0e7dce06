use crate::routines::regression::LinkType;
use eyre::{bail, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the hyperparameter grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Number of topics, `K`
    pub topics: usize,
    /// Weight of the outcome fit relative to the word reconstruction, in `[0, 1]`
    pub lambda: f64,
    /// Scale of the Gaussian prior on the regression weights
    pub eta: f64,
}

impl Hyperparameters {
    pub fn new(topics: usize, lambda: f64, eta: f64) -> Self {
        Hyperparameters {
            topics,
            lambda,
            eta,
        }
    }

    /// Ridge strength of the regression, `1 / (K η²)`
    pub fn ridge(&self) -> f64 {
        1.0 / (self.topics as f64 * self.eta.powi(2))
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "K = {}, lambda = {}, eta = {}",
            self.topics, self.lambda, self.eta
        )
    }
}

/// The parameters learned by a training run
///
/// Evaluation runs only ever borrow this bundle, so the fitted topics and weights cannot be modified
/// downstream of training.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    beta: Array2<f64>,
    v: Array1<f64>,
    link: LinkType,
}

impl FittedModel {
    pub fn new(beta: Array2<f64>, v: Array1<f64>, link: LinkType) -> Result<Self> {
        if v.len() != beta.nrows() + 1 {
            bail!(
                "Expected {} regression weights for {} topics, found {}",
                beta.nrows() + 1,
                beta.nrows(),
                v.len()
            );
        }
        Ok(FittedModel { beta, v, link })
    }

    /// The topic-word matrix (K×W)
    pub fn beta(&self) -> ArrayView2<f64> {
        self.beta.view()
    }

    /// The regression weights, bias last (K+1)
    pub fn v(&self) -> ArrayView1<f64> {
        self.v.view()
    }

    pub fn link(&self) -> LinkType {
        self.link
    }

    pub fn ntopics(&self) -> usize {
        self.beta.nrows()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.beta.ncols()
    }
}
