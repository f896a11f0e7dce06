//! sPLSA is a library with the building blocks needed to fit supervised probabilistic latent semantic
//! analysis topic models.
//!
//! A training run alternates expectation-maximization updates of the topics with a regression of the
//! document outcomes on the topic proportions and a gradient ascent on the proportions themselves, all under
//! a single joint likelihood. The fitted topics and weights are then evaluated on held-out documents.
//!
//! # Configuration
//!
//! A sweep is configured with a TOML file, see [Settings](crate::routines::settings::Settings) for the
//! available options, and started with [run_model](crate::entrypoints::run_model).

/// Provides the training and evaluation estimators
pub mod algorithms;
/// Entry points of the sweep, and the analysis and cleanup commands
pub mod entrypoints;
/// Routines used by the estimators
pub mod routines;
/// Data structures of the model
pub mod structs;

/// A collection of commonly used items
pub mod prelude {
    pub use crate::algorithms::{Estimator, Evaluation, Purpose, RunResult, Status, Training};
    pub use crate::entrypoints::{analyze, clean, run_combination, run_model, sweep, Datasets};
    pub use crate::routines::evaluation::Likelihood;
    pub use crate::routines::logger;
    pub use crate::routines::output::{
        Diagnostics, FileSink, MemorySink, ProgressPoint, RunInfo, SweepLog, SweepRecord,
    };
    pub use crate::routines::regression::{Link, LinkType};
    pub use crate::routines::settings;
    pub use crate::routines::settings::Settings;
    pub use crate::structs::corpus::{Corpus, Document};
    pub use crate::structs::outcomes::Outcomes;
    pub use crate::structs::parameters::{FittedModel, Hyperparameters};
    pub use crate::structs::stochastic::StochasticViolation;
}
