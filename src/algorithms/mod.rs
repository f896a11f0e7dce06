use crate::routines::evaluation::{Likelihood, Observation};
use crate::routines::output::RunInfo;
use crate::routines::regression::LinkType;
use crate::routines::settings::Settings;
use crate::structs::parameters::FittedModel;
use crate::structs::simplex::Simplex;
use crate::structs::stochastic::{check_stochastic, StochasticSummary};
use eyre::Result;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub mod evaluation;
pub mod training;

pub use evaluation::Evaluation;
pub use training::Training;

/// The role of a run within a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Learns the topics and regression weights
    Training,
    /// Evaluates a trained model on a validation set
    CrossValidation,
    /// Evaluates a trained model on a test set
    Testing,
}

impl Purpose {
    /// Short tag used in output file names
    pub fn tag(&self) -> &'static str {
        match self {
            Purpose::Training => "train",
            Purpose::CrossValidation => "cv",
            Purpose::Testing => "test",
        }
    }

    pub fn is_training(&self) -> bool {
        *self == Purpose::Training
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Purpose::Training => write!(f, "Training"),
            Purpose::CrossValidation => write!(f, "Cross validation"),
            Purpose::Testing => write!(f, "Testing"),
        }
    }
}

/// Represents the status of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The run is starting up
    Starting,
    /// The run is iterating
    InProgress,
    /// The joint likelihood stopped changing
    Converged,
    /// The run stopped after the maximum number of iterations
    MaxIterations,
    /// The run was aborted
    Failed(String),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Starting => write!(f, "Starting"),
            Status::InProgress => write!(f, "In progress"),
            Status::Converged => write!(f, "Converged"),
            Status::MaxIterations => write!(f, "Maximum iterations reached"),
            Status::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

/// The outcome of a training or evaluation run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run: RunInfo,
    pub link: LinkType,
    pub beta: Array2<f64>,
    pub theta: Array2<f64>,
    pub v: Array1<f64>,
    /// Predicted outcome of every document
    pub predictions: Array1<f64>,
    /// Fit quality after the last iteration
    pub likelihood: Likelihood,
    pub status: Status,
    pub iterations: usize,
}

impl RunResult {
    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// The parameters needed to evaluate the model on other documents
    pub fn into_fitted(self) -> Result<FittedModel> {
        FittedModel::new(self.beta, self.v, self.link)
    }
}

/// An iterative estimator over a corpus
///
/// Every iteration checks that the stochastic matrices are still valid, updates the expected counts and the
/// topics, fits the regression, moves the topic proportions, and measures the fit.
pub trait Estimator {
    fn settings(&self) -> &Settings;
    fn run_info(&self) -> &RunInfo;
    fn inc_iteration(&mut self) -> usize;
    fn iteration(&self) -> usize;
    fn status(&self) -> &Status;
    fn set_status(&mut self, status: Status);
    fn initialize(&mut self) -> Result<()>;
    /// Fails with a [StochasticViolation](crate::structs::stochastic::StochasticViolation) if `theta` or
    /// `beta` is no longer row-stochastic
    fn check_invariants(&self) -> Result<()>;
    fn estimation(&mut self) -> Result<()>;
    fn regression(&mut self) -> Result<()> {
        Ok(())
    }
    fn optimization(&mut self) -> Result<()>;
    fn evaluation(&mut self) -> Result<Observation>;
    fn logs(&self);
    fn report(&mut self) -> Result<()>;
    fn finalize(&mut self) -> Result<()>;
    fn next_iteration(&mut self) -> Result<bool> {
        let iteration = self.inc_iteration();
        let span = tracing::info_span!("", "{}", format!("Iteration {}", iteration));
        let _enter = span.enter();

        self.logs();
        self.check_invariants()?;
        self.estimation()?;
        self.regression()?;
        self.optimization()?;
        let observation = self.evaluation()?;
        self.report()?;

        if observation.converged {
            tracing::info!("The likelihood has converged");
            self.set_status(Status::Converged);
            return Ok(true);
        }
        if iteration >= self.settings().convergence.max_iterations {
            tracing::warn!("Maximum number of iterations reached");
            self.set_status(Status::MaxIterations);
            return Ok(true);
        }
        Ok(false)
    }
    fn fit(&mut self) -> Result<RunResult> {
        self.initialize()?;
        self.set_status(Status::InProgress);
        while !self.next_iteration()? {}
        self.finalize()?;
        self.into_result()
    }

    #[allow(clippy::wrong_self_convention)]
    fn into_result(&self) -> Result<RunResult>;
}

/// Fails on the first row of `theta` or `beta` that is not a probability distribution
pub(crate) fn check_matrices(
    theta: ArrayView2<f64>,
    beta: ArrayView2<f64>,
    epsilon: f64,
) -> Result<()> {
    check_stochastic("theta", theta, epsilon)?;
    check_stochastic("beta", beta, epsilon)?;
    Ok(())
}

/// Logs a corner of every matrix, and how stochastic `theta` and `beta` still are
pub(crate) fn log_matrices<'a>(
    simplex: &'a Simplex,
    beta: ArrayView2<'a, f64>,
    v: Option<ArrayView1<f64>>,
    epsilon: f64,
) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    if let Some(v) = v {
        tracing::debug!("Sample V {:?}: {}", v.dim(), v.slice(s![..v.len().min(10)]));
    }
    for (tag, matrix) in [
        ("Theta", simplex.theta()),
        ("Mu", simplex.mu()),
        ("Beta", beta),
    ] {
        let corner = matrix.slice(s![..matrix.nrows().min(5), ..matrix.ncols().min(5)]);
        tracing::debug!("Sample {} {:?}: {}", tag, matrix.dim(), corner);
    }

    tracing::debug!(
        "Stochastic matrix info for theta: {}",
        StochasticSummary::new(simplex.theta(), epsilon)
    );
    tracing::debug!(
        "Stochastic matrix info for beta: {}",
        StochasticSummary::new(beta, epsilon)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_tags() {
        assert_eq!(Purpose::Training.tag(), "train");
        assert_eq!(Purpose::CrossValidation.tag(), "cv");
        assert_eq!(Purpose::Testing.tag(), "test");
        let purpose: Purpose = serde_json::from_str("\"cross_validation\"").unwrap();
        assert_eq!(purpose, Purpose::CrossValidation);
    }

    #[test]
    fn test_matrix_logs_borrow_both_owners() {
        let simplex = Simplex::new(ndarray::array![[0.2, -0.1], [0.0, 1.5]], vec![0, 1]).unwrap();
        let beta = ndarray::array![[0.5, 0.5], [0.9, 0.1]];
        let v = ndarray::array![0.3, 0.7, 0.1];
        log_matrices(&simplex, beta.view(), Some(v.view()), 0.01);
        assert!(check_matrices(simplex.theta(), beta.view(), 0.01).is_ok());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::MaxIterations.to_string(), "Maximum iterations reached");
        assert_eq!(Status::Failed("oops".into()).to_string(), "Failed: oops");
    }
}
