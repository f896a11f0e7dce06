use super::{check_matrices, log_matrices, Estimator, Purpose, RunResult, Status};
use crate::routines::estimation::{e_step, post_step};
use crate::routines::evaluation::{ConvergenceMonitor, Likelihood, Observation};
use crate::routines::initialization::{gaussian_logits, pivots};
use crate::routines::optimization::simplex::SimplexOptimizer;
use crate::routines::output::{Completion, Diagnostics, ProgressPoint, RunInfo, Snapshot};
use crate::routines::regression::Link;
use crate::routines::settings::Settings;
use crate::structs::corpus::Corpus;
use crate::structs::outcomes::Outcomes;
use crate::structs::parameters::{FittedModel, Hyperparameters};
use crate::structs::simplex::Simplex;
use crate::structs::statistics::Statistics;
use eyre::{bail, eyre, Result};
use ndarray::Array1;
use rand::rngs::StdRng;

/// Infers the topic proportions of held-out documents under a trained model
///
/// The topics and regression weights are only borrowed, and stay exactly as training left them.
pub struct Evaluation<'a> {
    settings: &'a Settings,
    corpus: &'a Corpus,
    outcomes: &'a Outcomes,
    model: &'a FittedModel,
    sink: &'a mut dyn Diagnostics,
    run: RunInfo,
    link: Box<dyn Link>,
    simplex: Simplex,
    statistics: Statistics,
    monitor: ConvergenceMonitor,
    predictions: Array1<f64>,
    likelihood: Option<Likelihood>,
    iteration: usize,
    status: Status,
}

impl<'a> Evaluation<'a> {
    /// Draws the pivot columns, then `mu`, from `rng`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: &'a Settings,
        corpus: &'a Corpus,
        outcomes: &'a Outcomes,
        model: &'a FittedModel,
        purpose: Purpose,
        hyper: Hyperparameters,
        rng: &mut StdRng,
        sink: &'a mut dyn Diagnostics,
    ) -> Result<Self> {
        if purpose.is_training() {
            bail!("An evaluation run cannot be used for training");
        }
        if hyper.topics != model.ntopics() {
            bail!(
                "The model has {} topics, but the run expects {}",
                model.ntopics(),
                hyper.topics
            );
        }
        if corpus.vocabulary_size() != model.vocabulary_size() {
            bail!(
                "The model was trained on {} words, but the corpus has {}",
                model.vocabulary_size(),
                corpus.vocabulary_size()
            );
        }
        outcomes.check_aligned(corpus.ndocs())?;

        let ndocs = corpus.ndocs();
        let ntopics = hyper.topics;
        let pivots = pivots(rng, ndocs, ntopics)?;
        let mu = gaussian_logits(rng, ndocs, ntopics);

        Ok(Evaluation {
            settings,
            corpus,
            outcomes,
            model,
            sink,
            run: RunInfo::new(purpose, hyper),
            link: model.link().link(),
            simplex: Simplex::new(mu, pivots)?,
            statistics: Statistics::new(ndocs, ntopics, corpus.vocabulary_size()),
            monitor: ConvergenceMonitor::new(
                settings.advanced.initial_step,
                settings.convergence.difference,
                settings.convergence.evaluation_rate,
                settings.advanced.step_shrinkage,
            ),
            predictions: Array1::zeros(ndocs),
            likelihood: None,
            iteration: 0,
            status: Status::Starting,
        })
    }

    fn snapshot(&mut self, label: &str) -> Result<()> {
        let snapshot = Snapshot {
            beta: self.model.beta(),
            theta: self.simplex.theta(),
            v: Some(self.model.v()),
        };
        self.sink.snapshot(&self.run, label, &snapshot)
    }
}

impl Estimator for Evaluation<'_> {
    fn settings(&self) -> &Settings {
        self.settings
    }

    fn run_info(&self) -> &RunInfo {
        &self.run
    }

    fn inc_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    fn iteration(&self) -> usize {
        self.iteration
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn initialize(&mut self) -> Result<()> {
        tracing::info!("{} mode, {}, {} link", self.run.purpose, self.run.hyper, self.link.link_type());
        tracing::info!(
            "Stats: N = {}, W = {}, K = {}, Average unique words per document: {:.2}",
            self.corpus.ndocs(),
            self.corpus.vocabulary_size(),
            self.run.hyper.topics,
            self.corpus.average_unique_words()
        );
        tracing::info!("Stats: Total word count: {}", self.corpus.total_word_count());

        self.sink.begin(&self.run)?;
        self.snapshot("initial")
    }

    fn check_invariants(&self) -> Result<()> {
        check_matrices(
            self.simplex.theta(),
            self.model.beta(),
            self.settings.convergence.epsilon,
        )
    }

    fn estimation(&mut self) -> Result<()> {
        let smoothing = self.settings.advanced.smoothing;
        self.statistics.clear();
        e_step(
            self.corpus,
            self.simplex.theta(),
            self.model.beta(),
            smoothing,
            &mut self.statistics,
        );
        post_step(
            self.corpus,
            self.simplex.theta(),
            self.model.beta(),
            smoothing,
            &mut self.statistics,
        );
        Ok(())
    }

    fn optimization(&mut self) -> Result<()> {
        let optimizer = SimplexOptimizer {
            link: self.link.as_ref(),
            lambda: self.run.hyper.lambda,
            total_words: self.corpus.total_word_count() as f64,
            smoothing: self.settings.advanced.smoothing,
            passes: self.settings.advanced.max_theta_iterations,
            training: false,
        };
        optimizer.optimize(
            &mut self.simplex,
            &self.statistics,
            self.outcomes.values(),
            self.model.v(),
            self.monitor.step(),
        );
        Ok(())
    }

    fn evaluation(&mut self) -> Result<Observation> {
        let predictions = self
            .link
            .predictions(self.simplex.theta_with_bias(), self.model.v());
        let likelihood = Likelihood::compute(
            self.corpus,
            self.simplex.theta(),
            self.model.beta(),
            predictions.view(),
            self.outcomes.values(),
            &self.run.hyper,
            self.model.v(),
            false,
        )?;

        let observation = self.monitor.observe(likelihood.joint);
        tracing::info!(
            "Likelihood difference = {}, Likelihood rate = {}",
            observation.difference.abs(),
            observation.rate
        );
        tracing::info!(
            "Likelihood: {}, Perplexity: {}, RMSE: {}",
            likelihood.joint,
            likelihood.perplexity,
            likelihood.rmse
        );
        if observation.shrunk {
            tracing::debug!("Step size reduced to {}", self.monitor.step());
        }

        self.predictions = predictions;
        self.likelihood = Some(likelihood);
        Ok(observation)
    }

    fn logs(&self) {
        log_matrices(
            &self.simplex,
            self.model.beta(),
            Some(self.model.v()),
            self.settings.convergence.epsilon,
        );
    }

    fn report(&mut self) -> Result<()> {
        if let Some(likelihood) = self.likelihood {
            let point = ProgressPoint {
                iteration: self.iteration,
                rmse: likelihood.rmse,
                likelihood: likelihood.joint,
                perplexity: likelihood.perplexity,
            };
            self.sink.progress(&self.run, &point)?;
        }
        if self.iteration % self.settings.output.dump_every == 0 {
            self.snapshot(&self.iteration.to_string())?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.logs();
        self.snapshot("final")?;
        let rmse = self.likelihood.map(|l| l.rmse).unwrap_or(f64::NAN);
        let completion = Completion {
            status: &self.status,
            iterations: self.iteration,
            predictions: self.predictions.view(),
            rmse,
        };
        self.sink.finish(&self.run, &completion)?;
        tracing::info!("Predicted RMSE: {}", rmse);
        tracing::info!("{} completed after {} iterations: {}", self.run.purpose, self.iteration, self.status);
        Ok(())
    }

    fn into_result(&self) -> Result<RunResult> {
        let likelihood = self
            .likelihood
            .ok_or_else(|| eyre!("The run has not completed any iteration"))?;
        Ok(RunResult {
            run: self.run,
            link: self.model.link(),
            beta: self.model.beta().to_owned(),
            theta: self.simplex.theta().to_owned(),
            v: self.model.v().to_owned(),
            predictions: self.predictions.clone(),
            likelihood,
            status: self.status.clone(),
            iterations: self.iteration,
        })
    }
}
