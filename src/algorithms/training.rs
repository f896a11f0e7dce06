use super::{check_matrices, log_matrices, Estimator, Purpose, RunResult, Status};
use crate::routines::estimation::{e_step, m_step, post_step};
use crate::routines::evaluation::{ConvergenceMonitor, Likelihood, Observation};
use crate::routines::initialization::{gaussian_logits, pivots, stochastic_matrix};
use crate::routines::optimization::simplex::SimplexOptimizer;
use crate::routines::output::{Completion, Diagnostics, ProgressPoint, RunInfo, Snapshot};
use crate::routines::regression::{Link, Regression};
use crate::routines::settings::Settings;
use crate::structs::corpus::Corpus;
use crate::structs::outcomes::Outcomes;
use crate::structs::parameters::Hyperparameters;
use crate::structs::simplex::Simplex;
use crate::structs::statistics::Statistics;
use eyre::{eyre, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;

/// Jointly learns the topics, the topic proportions and the regression weights of a corpus
pub struct Training<'a> {
    settings: &'a Settings,
    corpus: &'a Corpus,
    outcomes: &'a Outcomes,
    sink: &'a mut dyn Diagnostics,
    run: RunInfo,
    link: Box<dyn Link>,
    simplex: Simplex,
    beta: Array2<f64>,
    v: Option<Array1<f64>>,
    statistics: Statistics,
    monitor: ConvergenceMonitor,
    predictions: Array1<f64>,
    likelihood: Option<Likelihood>,
    iteration: usize,
    status: Status,
}

impl<'a> Training<'a> {
    /// Draws the starting point of the run from `rng`: the pivot columns, then `mu`, then `beta`
    pub fn new(
        settings: &'a Settings,
        corpus: &'a Corpus,
        outcomes: &'a Outcomes,
        hyper: Hyperparameters,
        rng: &mut StdRng,
        sink: &'a mut dyn Diagnostics,
    ) -> Result<Self> {
        outcomes.check_aligned(corpus.ndocs())?;
        let ndocs = corpus.ndocs();
        let nwords = corpus.vocabulary_size();
        let ntopics = hyper.topics;

        let pivots = pivots(rng, ndocs, ntopics)?;
        let mu = gaussian_logits(rng, ndocs, ntopics);
        let beta = stochastic_matrix(rng, ntopics, nwords);

        Ok(Training {
            settings,
            corpus,
            outcomes,
            sink,
            run: RunInfo::new(Purpose::Training, hyper),
            link: settings.config.link.link(),
            simplex: Simplex::new(mu, pivots)?,
            beta,
            v: None,
            statistics: Statistics::new(ndocs, ntopics, nwords),
            monitor: ConvergenceMonitor::new(
                settings.advanced.initial_step,
                settings.convergence.difference,
                settings.convergence.training_rate,
                settings.advanced.step_shrinkage,
            ),
            predictions: Array1::zeros(ndocs),
            likelihood: None,
            iteration: 0,
            status: Status::Starting,
        })
    }

    fn weights(&self) -> Result<ArrayView1<f64>> {
        self.v
            .as_ref()
            .map(|v| v.view())
            .ok_or_else(|| eyre!("The regression weights have not been fitted yet"))
    }

    fn snapshot(&mut self, label: &str) -> Result<()> {
        let snapshot = Snapshot {
            beta: self.beta.view(),
            theta: self.simplex.theta(),
            v: self.v.as_ref().map(|v| v.view()),
        };
        self.sink.snapshot(&self.run, label, &snapshot)
    }
}

impl Estimator for Training<'_> {
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
            self.beta.view(),
            self.settings.convergence.epsilon,
        )
    }

    fn estimation(&mut self) -> Result<()> {
        let smoothing = self.settings.advanced.smoothing;
        self.statistics.clear();
        e_step(
            self.corpus,
            self.simplex.theta(),
            self.beta.view(),
            smoothing,
            &mut self.statistics,
        );
        self.beta = m_step(&self.statistics, smoothing);
        post_step(
            self.corpus,
            self.simplex.theta(),
            self.beta.view(),
            smoothing,
            &mut self.statistics,
        );
        Ok(())
    }

    fn regression(&mut self) -> Result<()> {
        let problem = Regression {
            theta_with_bias: self.simplex.theta_with_bias(),
            outcomes: self.outcomes.values(),
            hyper: self.run.hyper,
            previous: self.v.as_ref().map(|v| v.view()),
            max_iterations: self.settings.advanced.max_v_iterations,
            learning_rate: self.settings.advanced.sigmoid_learning_rate,
        };
        let v = self.link.fit_weights(&problem)?;
        self.v = Some(v);
        Ok(())
    }

    fn optimization(&mut self) -> Result<()> {
        let optimizer = SimplexOptimizer {
            link: self.link.as_ref(),
            lambda: self.run.hyper.lambda,
            total_words: self.corpus.total_word_count() as f64,
            smoothing: self.settings.advanced.smoothing,
            passes: self.settings.advanced.max_theta_iterations,
            training: true,
        };
        let v = self
            .v
            .as_ref()
            .ok_or_else(|| eyre!("The regression weights have not been fitted yet"))?;
        optimizer.optimize(
            &mut self.simplex,
            &self.statistics,
            self.outcomes.values(),
            v.view(),
            self.monitor.step(),
        );
        Ok(())
    }

    fn evaluation(&mut self) -> Result<Observation> {
        let v = self.weights()?;
        let predictions = self.link.predictions(self.simplex.theta_with_bias(), v);
        let likelihood = Likelihood::compute(
            self.corpus,
            self.simplex.theta(),
            self.beta.view(),
            predictions.view(),
            self.outcomes.values(),
            &self.run.hyper,
            v,
            true,
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
            self.beta.view(),
            self.v.as_ref().map(|v| v.view()),
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
        tracing::info!("Training completed after {} iterations: {}", self.iteration, self.status);
        Ok(())
    }

    fn into_result(&self) -> Result<RunResult> {
        let likelihood = self
            .likelihood
            .ok_or_else(|| eyre!("The run has not completed any iteration"))?;
        Ok(RunResult {
            run: self.run,
            link: self.link.link_type(),
            beta: self.beta.clone(),
            theta: self.simplex.theta().to_owned(),
            v: self.weights()?.to_owned(),
            predictions: self.predictions.clone(),
            likelihood,
            status: self.status.clone(),
            iterations: self.iteration,
        })
    }
}
