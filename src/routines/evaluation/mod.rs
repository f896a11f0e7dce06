//! Fit quality of a run, and the stopping rule built on it

pub mod convergence;
pub mod likelihood;

pub use convergence::{ConvergenceMonitor, Observation};
pub use likelihood::Likelihood;
