use crate::algorithms::Purpose;
use crate::routines::output::OutputFile;
use crate::routines::regression::LinkType;
use config::Config as eConfig;
use eyre::{bail, Result, WrapErr};
use serde::Deserialize;
use serde_derive::Serialize;
use std::io::Write;

/// Contains all settings for a sweep
#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// General configuration settings
    pub config: Config,
    /// Location of the datasets
    pub data: Data,
    /// The grid of hyperparameters to fit
    pub sweep: Sweep,
    /// Configuration for the convergence criteria
    pub convergence: Convergence,
    /// Advanced options, mostly step sizes and iteration counts of the inner optimizers
    pub advanced: Advanced,
    /// Configuration of the random starting points
    pub prior: Prior,
    /// Configuration for the output files
    pub output: Output,
    /// Configuration for logging
    pub log: Log,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        self.sweep.validate()?;
        self.convergence.validate()?;
        self.advanced.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// General configuration settings
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// The link function between topic proportions and outcomes
    pub link: LinkType,
    /// The purpose of the run on the held-out dataset, either `cross_validation` or `testing`
    pub evaluation: Purpose,
    /// If true, stop after the first combination of the sweep
    pub single_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            link: LinkType::Linear,
            evaluation: Purpose::CrossValidation,
            single_run: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.evaluation == Purpose::Training {
            bail!("The evaluation purpose must be either `cross_validation` or `testing`");
        }
        Ok(())
    }
}

/// A corpus together with the outcome of each of its documents
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    /// Path to the document file, one document per line
    pub documents: String,
    /// Path to the outcome file, one value per line
    pub outcomes: String,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Data {
    pub training: Dataset,
    /// The held-out dataset, evaluated with the topics and weights learned from `training`
    pub evaluation: Dataset,
    /// Optional vocabulary file, one word per line
    ///
    /// Used to print words in the top-words reports, and to determine the vocabulary size.
    pub vocabulary: Option<String>,
    /// Overrides the vocabulary size
    ///
    /// If neither this nor `vocabulary` is given, the largest word id in the datasets is used.
    pub vocabulary_size: Option<usize>,
}

impl Default for Data {
    fn default() -> Self {
        Data {
            training: Dataset {
                documents: String::from("data/training_documents.txt"),
                outcomes: String::from("data/training_outcomes.txt"),
            },
            evaluation: Dataset {
                documents: String::from("data/evaluation_documents.txt"),
                outcomes: String::from("data/evaluation_outcomes.txt"),
            },
            vocabulary: None,
            vocabulary_size: None,
        }
    }
}

/// The hyperparameter grid
///
/// Combinations are visited with the number of topics in the outer loop, then `eta`, then `lambda`.
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Sweep {
    /// Number of topics, `K`
    pub topics: Vec<usize>,
    /// Weight of the outcome fit, each in `[0, 1]`
    pub lambdas: Vec<f64>,
    /// Scale of the prior on the regression weights, each positive
    pub etas: Vec<f64>,
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep {
            topics: vec![10],
            lambdas: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
            etas: vec![1.0],
        }
    }
}

impl Sweep {
    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() || self.lambdas.is_empty() || self.etas.is_empty() {
            bail!("The sweep needs at least one value of topics, lambdas and etas");
        }
        if let Some(k) = self.topics.iter().find(|&&k| k == 0) {
            bail!("The number of topics must be positive, got {}", k);
        }
        if let Some(lambda) = self.lambdas.iter().find(|l| !(0.0..=1.0).contains(*l)) {
            bail!("Lambda must be within [0, 1], got {}", lambda);
        }
        if let Some(eta) = self.etas.iter().find(|&&e| e.is_nan() || e <= 0.0) {
            bail!("Eta must be positive, got {}", eta);
        }
        Ok(())
    }

    /// Number of combinations in the grid
    pub fn len(&self) -> usize {
        self.topics.len() * self.lambdas.len() * self.etas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// This struct contains the convergence criteria for the algorithm
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Convergence {
    /// Maximum number of iterations of a run
    pub max_iterations: usize,
    /// A run stops once the joint likelihood changes by less than this
    pub difference: f64,
    /// Relative likelihood change below which the step size shrinks during training
    pub training_rate: f64,
    /// Relative likelihood change below which the step size shrinks during evaluation
    pub evaluation_rate: f64,
    /// Tolerance of the stochastic matrix checks
    pub epsilon: f64,
}

impl Default for Convergence {
    fn default() -> Self {
        Convergence {
            max_iterations: 100,
            difference: 1e-10,
            training_rate: 1e-2,
            evaluation_rate: 1e-2,
            epsilon: 0.01,
        }
    }
}

impl Convergence {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            bail!("At least one iteration is required");
        }
        if self.epsilon <= 0.0 {
            bail!("Epsilon must be positive, got {}", self.epsilon);
        }
        Ok(())
    }
}

/// This struct contains advanced options and hyperparameters
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Advanced {
    /// Number of gradient passes over `mu` per iteration
    pub max_theta_iterations: usize,
    /// Number of gradient sweeps of the sigmoid regression per iteration
    pub max_v_iterations: usize,
    /// Initial step size of the gradient ascent on `mu`
    pub initial_step: f64,
    /// Factor applied to the step size when the likelihood stalls
    pub step_shrinkage: f64,
    /// Additive smoothing of the EM updates
    pub smoothing: f64,
    /// Step size of the sigmoid regression
    pub sigmoid_learning_rate: f64,
}

impl Default for Advanced {
    fn default() -> Self {
        Advanced {
            max_theta_iterations: 20,
            max_v_iterations: 100,
            initial_step: 500.0,
            step_shrinkage: 0.9,
            smoothing: 1e-80,
            sigmoid_learning_rate: 10.0,
        }
    }
}

impl Advanced {
    pub fn validate(&self) -> Result<()> {
        if self.initial_step <= 0.0 {
            bail!("The initial step size must be positive, got {}", self.initial_step);
        }
        if !(self.step_shrinkage > 0.0 && self.step_shrinkage <= 1.0) {
            bail!(
                "The step shrinkage must be within (0, 1], got {}",
                self.step_shrinkage
            );
        }
        if self.smoothing < 0.0 {
            bail!("Smoothing must be non-negative, got {}", self.smoothing);
        }
        Ok(())
    }
}

/// Configuration of the random starting points
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Prior {
    /// The seed for the random number generator
    pub seed: u64,
}

impl Default for Prior {
    fn default() -> Self {
        Prior { seed: 22 }
    }
}

/// Configuration for the output files
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Output {
    /// Whether to write the output files
    pub write: bool,
    /// The (relative) path to write the output files to
    pub path: String,
    /// Matrices are written every `dump_every` iterations, in addition to the initial and final ones
    pub dump_every: usize,
    /// Number of words listed per topic in the top-words reports
    pub top_words: usize,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            write: true,
            path: String::from("outputs/"),
            dump_every: 200,
            top_words: 40,
        }
    }
}

impl Output {
    pub fn validate(&self) -> Result<()> {
        if self.dump_every == 0 {
            bail!("`dump_every` must be at least 1");
        }
        Ok(())
    }

    /// Parses the output folder location
    ///
    /// If a `#` symbol is found, it will automatically increment the number by one.
    pub fn parse_output_folder(&mut self) -> Result<()> {
        if self.path.is_empty() {
            self.path = Output::default().path;
        }

        let folder = &self.path;
        match folder.matches('#').count() {
            0 => Ok(()),
            1 => {
                let mut num = 1;
                while std::path::Path::new(&folder.replace('#', &num.to_string())).exists() {
                    num += 1;
                }
                self.path = folder.replace('#', &num.to_string());
                Ok(())
            }
            _ => {
                bail!("Only one `#` symbol is allowed in the output path. Rename the `output.path` setting in the configuration file and re-run the program.")
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
    /// The maximum log level to display
    ///
    /// The log level is defined as a string, and can be one of the following:
    /// - `trace`
    /// - `debug`
    /// - `info`
    /// - `warn`
    /// - `error`
    pub level: String,
    /// The file to write the log to, within the output folder
    pub file: String,
    /// Whether to write logs
    ///
    /// If set to `false`, no global subscriber is installed.
    pub write: bool,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: String::from("info"),
            file: String::from("log.txt"),
            write: true,
        }
    }
}

/// Loads and validates the settings from a TOML configuration file, without touching the output folder
///
/// Entries in the TOML file may be overridden by environment variables. The environment variables must be prefixed with `SPLSA_`, and the TOML entry must be in uppercase. For example, the output may be disabled by setting the environment variable `SPLSA_OUTPUT_WRITE=false`. A single underscore, `_`, is used as the separator for nested entries.
pub fn load(path: impl Into<String>) -> Result<Settings> {
    let settings_path = path.into();

    let parsed = eConfig::builder()
        .add_source(config::File::with_name(&settings_path).format(config::FileFormat::Toml))
        .add_source(config::Environment::with_prefix("SPLSA").separator("_"))
        .build()
        .wrap_err_with(|| format!("Unable to read the configuration file {}", settings_path))?;

    let settings: Settings = parsed
        .try_deserialize()
        .wrap_err_with(|| format!("Invalid configuration in {}", settings_path))?;

    settings.validate()?;
    Ok(settings)
}

/// Parses the settings from a TOML configuration file
///
/// The settings are validated, the output folder is resolved, and a copy of the settings is written to file.
pub fn read(path: impl Into<String>) -> Result<Settings> {
    let mut settings = load(path)?;

    settings.output.parse_output_folder()?;

    if settings.output.write {
        if let Err(error) = write_settings_to_file(&settings) {
            bail!("Could not write settings to file: {}", error);
        }
    }

    Ok(settings)
}

/// Writes a copy of the parsed settings to `settings.json` in the output folder
pub fn write_settings_to_file(settings: &Settings) -> Result<()> {
    let serialized = serde_json::to_string_pretty(settings)?;

    let outputfile = OutputFile::new(settings.output.path.as_str(), "settings.json")?;
    let mut file = outputfile.file_owned();
    file.write_all(serialized.as_bytes())?;
    Ok(())
}
