use crate::algorithms::{Estimator, Evaluation, Training};
use crate::routines::logger;
use crate::routines::output::matrix::{read_matrix_file, read_vector_file};
use crate::routines::output::report::top_words_report;
use crate::routines::output::{Diagnostics, FileSink, MemorySink, SweepLog, SweepRecord};
use crate::routines::settings::{Data, Dataset, Settings};
use crate::structs::corpus::{read_vocabulary, Corpus, Document};
use crate::structs::outcomes::Outcomes;
use crate::structs::parameters::Hyperparameters;

use eyre::{bail, Result, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::Instant;

/// The documents and outcomes of a sweep
#[derive(Debug, Clone)]
pub struct Datasets {
    pub training: Corpus,
    pub training_outcomes: Outcomes,
    pub evaluation: Corpus,
    pub evaluation_outcomes: Outcomes,
    pub vocabulary: Option<Vec<String>>,
}

impl Datasets {
    /// Reads every file named in the data settings
    ///
    /// The vocabulary size is, in order of precedence, `vocabulary_size`, the length of the vocabulary file,
    /// or one more than the largest word id of either corpus.
    pub fn load(data: &Data) -> Result<Self> {
        let vocabulary = match &data.vocabulary {
            Some(path) => Some(read_vocabulary(path)?),
            None => None,
        };
        let training = Corpus::read_documents(&data.training.documents)?;
        let evaluation = Corpus::read_documents(&data.evaluation.documents)?;
        let vocabulary_size = vocabulary_size(
            data,
            vocabulary.as_deref(),
            &[training.as_slice(), evaluation.as_slice()],
        );

        Datasets::new(
            Corpus::new(training, vocabulary_size)
                .wrap_err_with(|| format!("Invalid training corpus {}", data.training.documents))?,
            read_outcomes(&data.training)?,
            Corpus::new(evaluation, vocabulary_size).wrap_err_with(|| {
                format!("Invalid evaluation corpus {}", data.evaluation.documents)
            })?,
            read_outcomes(&data.evaluation)?,
            vocabulary,
        )
    }

    pub fn new(
        training: Corpus,
        training_outcomes: Outcomes,
        evaluation: Corpus,
        evaluation_outcomes: Outcomes,
        vocabulary: Option<Vec<String>>,
    ) -> Result<Self> {
        training_outcomes.check_aligned(training.ndocs())?;
        evaluation_outcomes.check_aligned(evaluation.ndocs())?;
        if training.vocabulary_size() != evaluation.vocabulary_size() {
            bail!(
                "The training corpus has {} words, but the evaluation corpus has {}",
                training.vocabulary_size(),
                evaluation.vocabulary_size()
            );
        }
        Ok(Datasets {
            training,
            training_outcomes,
            evaluation,
            evaluation_outcomes,
            vocabulary,
        })
    }
}

fn read_outcomes(dataset: &Dataset) -> Result<Outcomes> {
    Outcomes::read(&dataset.outcomes)
}

fn vocabulary_size(data: &Data, vocabulary: Option<&[String]>, corpora: &[&[Document]]) -> usize {
    if let Some(size) = data.vocabulary_size {
        return size;
    }
    if let Some(words) = vocabulary {
        return words.len();
    }
    corpora
        .iter()
        .flat_map(|documents| documents.iter())
        .filter_map(|document| document.max_word_id())
        .max()
        .map_or(0, |id| id + 1)
}

/// Primary entrypoint, runs the sweep described by a configuration file
///
/// Every combination of the sweep is trained and then evaluated on the held-out dataset. Outputs are written
/// to the output folder, together with a `sweep.csv` summary.
pub fn run_model(settings: Settings) -> Result<SweepLog> {
    let now = Instant::now();
    logger::setup_log(&settings)?;
    tracing::info!("Starting sPLSA");

    let datasets = Datasets::load(&settings.data)?;
    tracing::info!(
        "Loaded {} training and {} evaluation documents over {} words",
        datasets.training.ndocs(),
        datasets.evaluation.ndocs(),
        datasets.training.vocabulary_size()
    );

    let log = if settings.output.write {
        tracing::info!("Output files will be written to {}", settings.output.path);
        let mut sink = FileSink::new(
            settings.output.path.clone(),
            datasets.vocabulary.clone(),
            settings.output.top_words,
        );
        let log = sweep(&settings, &datasets, &mut sink)?;
        log.write(&settings.output.path)?;
        log
    } else {
        tracing::info!("Output files will not be written - set `write = true` in the `output` section to enable output files");
        let mut sink = MemorySink::new();
        sweep(&settings, &datasets, &mut sink)?
    };

    if let Some(best) = log.best() {
        tracing::info!(
            "Best combination: K = {}, lambda = {}, eta = {} with predicted RMSE {}",
            best.k,
            best.lambda,
            best.eta,
            best.evaluation_rmse.unwrap_or(f64::NAN)
        );
    }
    tracing::info!("Sweep finished in {:.2?}", now.elapsed());
    Ok(log)
}

/// Visits every combination of the sweep, in the order topics, eta, lambda
///
/// A single random number generator, seeded from the settings, provides the starting points of every run.
/// A failing combination is logged and recorded, and the sweep moves on to the next one.
pub fn sweep(
    settings: &Settings,
    datasets: &Datasets,
    sink: &mut dyn Diagnostics,
) -> Result<SweepLog> {
    let mut rng = StdRng::seed_from_u64(settings.prior.seed);
    let mut log = SweepLog::new();

    'sweep: for &topics in &settings.sweep.topics {
        for &eta in &settings.sweep.etas {
            for &lambda in &settings.sweep.lambdas {
                let hyper = Hyperparameters::new(topics, lambda, eta);
                let span = tracing::info_span!("", "{}", format!("K={} e={} l={}", topics, eta, lambda));
                let _enter = span.enter();

                let record = match run_combination(settings, datasets, hyper, &mut rng, sink) {
                    Ok(record) => record,
                    Err(error) => {
                        tracing::error!("Combination {} failed: {:?}", hyper, error);
                        SweepRecord::failed(&hyper, &error)
                    }
                };
                log.push(record);

                if settings.config.single_run {
                    break 'sweep;
                }
            }
        }
    }

    Ok(log)
}

/// Trains a model for one combination, then evaluates it on the held-out dataset
pub fn run_combination(
    settings: &Settings,
    datasets: &Datasets,
    hyper: Hyperparameters,
    rng: &mut StdRng,
    sink: &mut dyn Diagnostics,
) -> Result<SweepRecord> {
    let training = Training::new(
        settings,
        &datasets.training,
        &datasets.training_outcomes,
        hyper,
        rng,
        sink,
    )?
    .fit()?;
    let iterations = training.iterations;
    let status = training.status.clone();
    let training_rmse = training.likelihood.rmse;
    let model = training.into_fitted()?;

    let evaluation = Evaluation::new(
        settings,
        &datasets.evaluation,
        &datasets.evaluation_outcomes,
        &model,
        settings.config.evaluation,
        hyper,
        rng,
        sink,
    )?
    .fit()?;

    Ok(SweepRecord::completed(
        &hyper,
        &status,
        iterations,
        training_rmse,
        evaluation.likelihood.rmse,
        evaluation.likelihood.perplexity,
    ))
}

/// Renders the top-words report of a persisted topic-word matrix
pub fn analyze(
    beta: impl AsRef<Path>,
    v: Option<impl AsRef<Path>>,
    vocabulary: Option<impl AsRef<Path>>,
    top: usize,
) -> Result<String> {
    let beta = read_matrix_file(beta)?;
    let v = match v {
        Some(path) => {
            let v = read_vector_file(path)?;
            if v.len() < beta.nrows() {
                bail!(
                    "Expected at least {} regression weights, found {}",
                    beta.nrows(),
                    v.len()
                );
            }
            Some(v)
        }
        None => None,
    };
    let vocabulary = match vocabulary {
        Some(path) => Some(read_vocabulary(path)?),
        None => None,
    };

    Ok(top_words_report(
        beta.view(),
        v.as_ref().map(|v| v.view()),
        vocabulary.as_deref(),
        top,
    ))
}

/// Deletes the output folder
pub fn clean(settings: &Settings) -> Result<()> {
    let folder = Path::new(&settings.output.path);
    if settings.output.path.contains('#') {
        bail!(
            "The output path {} is a template, remove the folders it expands to manually",
            settings.output.path
        );
    }
    if folder.exists() {
        std::fs::remove_dir_all(folder)
            .wrap_err_with(|| format!("Unable to remove {}", folder.display()))?;
        tracing::info!("Removed {}", folder.display());
    } else {
        tracing::info!("Nothing to clean, {} does not exist", folder.display());
    }
    Ok(())
}
