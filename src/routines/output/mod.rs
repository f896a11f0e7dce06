//! Persistence of the state and progress of a run
//!
//! The estimators only ever talk to a [Diagnostics] sink. [FileSink] writes the files of a sweep into the
//! output folder, while [MemorySink] keeps everything in memory.

use crate::algorithms::{Purpose, Status};
use crate::structs::parameters::Hyperparameters;
use eyre::{Result, WrapErr};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::fs::{create_dir_all, File, OpenOptions};
use std::path::{Path, PathBuf};

pub mod files;
pub mod matrix;
pub mod report;
pub mod sweep;

pub use files::FileSink;
pub use sweep::{SweepLog, SweepRecord};

/// Identifies a single run of the sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunInfo {
    pub purpose: Purpose,
    pub hyper: Hyperparameters,
}

impl RunInfo {
    pub fn new(purpose: Purpose, hyper: Hyperparameters) -> Self {
        RunInfo { purpose, hyper }
    }

    /// Name of an output file of this run, `{prefix}_{purpose}_l{λ}_e{η}_k{K}[_{suffix}].txt`
    ///
    /// `λ` is printed with up to three decimals. `η` is printed with up to three decimals when below one,
    /// and truncated to an integer otherwise.
    pub fn file_name(&self, prefix: &str, suffix: Option<&str>) -> String {
        let eta = if self.hyper.eta < 1.0 {
            format_decimal(self.hyper.eta)
        } else {
            format!("{}", self.hyper.eta.trunc() as i64)
        };

        let mut name = format!(
            "{}_{}_l{}_e{}_k{}",
            prefix,
            self.purpose.tag(),
            format_decimal(self.hyper.lambda),
            eta,
            self.hyper.topics
        );
        if let Some(suffix) = suffix {
            name.push('_');
            name.push_str(suffix);
        }
        name.push_str(".txt");
        name
    }
}

/// Formats a value with at most three decimals, without trailing zeros
pub fn format_decimal(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => String::from("0"),
        other => other.to_string(),
    }
}

/// Fit quality at the end of an iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPoint {
    pub iteration: usize,
    pub rmse: f64,
    pub likelihood: f64,
    pub perplexity: f64,
}

/// The state of a run at a given point
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub beta: ArrayView2<'a, f64>,
    pub theta: ArrayView2<'a, f64>,
    /// The regression weights, not yet available before the first fit of a training run
    pub v: Option<ArrayView1<'a, f64>>,
}

/// How a run ended
#[derive(Debug, Clone)]
pub struct Completion<'a> {
    pub status: &'a Status,
    pub iterations: usize,
    /// Predicted outcome of every document
    pub predictions: ArrayView1<'a, f64>,
    /// Error of the predictions against the observed outcomes
    pub rmse: f64,
}

/// Receives the progress of a run
pub trait Diagnostics {
    /// Called once, before the first iteration
    fn begin(&mut self, run: &RunInfo) -> Result<()>;

    /// Called at the end of every iteration
    fn progress(&mut self, run: &RunInfo, point: &ProgressPoint) -> Result<()>;

    /// Called with the `initial` and `final` states, and every few iterations in between
    fn snapshot(&mut self, run: &RunInfo, label: &str, snapshot: &Snapshot) -> Result<()>;

    /// Called once, after the last iteration
    fn finish(&mut self, run: &RunInfo, completion: &Completion) -> Result<()>;
}

/// A state captured by [MemorySink]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub run: RunInfo,
    pub label: String,
    pub beta: Array2<f64>,
    pub theta: Array2<f64>,
    pub v: Option<Array1<f64>>,
}

/// Keeps the progress and snapshots of every run in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub runs: Vec<RunInfo>,
    pub progress: Vec<(RunInfo, ProgressPoint)>,
    pub snapshots: Vec<StoredSnapshot>,
    pub completions: Vec<(RunInfo, Status, usize, f64)>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// The progress of a single run, in order
    pub fn trace(&self, run: &RunInfo) -> Vec<ProgressPoint> {
        self.progress
            .iter()
            .filter(|(r, _)| r == run)
            .map(|(_, point)| *point)
            .collect()
    }

    pub fn labels(&self, run: &RunInfo) -> Vec<&str> {
        self.snapshots
            .iter()
            .filter(|s| &s.run == run)
            .map(|s| s.label.as_str())
            .collect()
    }
}

impl Diagnostics for MemorySink {
    fn begin(&mut self, run: &RunInfo) -> Result<()> {
        self.runs.push(*run);
        Ok(())
    }

    fn progress(&mut self, run: &RunInfo, point: &ProgressPoint) -> Result<()> {
        self.progress.push((*run, *point));
        Ok(())
    }

    fn snapshot(&mut self, run: &RunInfo, label: &str, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.push(StoredSnapshot {
            run: *run,
            label: label.to_string(),
            beta: snapshot.beta.to_owned(),
            theta: snapshot.theta.to_owned(),
            v: snapshot.v.map(|v| v.to_owned()),
        });
        Ok(())
    }

    fn finish(&mut self, run: &RunInfo, completion: &Completion) -> Result<()> {
        self.completions.push((
            *run,
            completion.status.clone(),
            completion.iterations,
            completion.rmse,
        ));
        Ok(())
    }
}

/// Contains all the necessary information of an output file
#[derive(Debug)]
pub struct OutputFile {
    file: File,
    relative_path: PathBuf,
}

impl OutputFile {
    /// Creates (or truncates) `file_name` within `folder`, creating the folder if needed
    pub fn new(folder: &str, file_name: &str) -> Result<Self> {
        Self::open(folder, file_name, false)
    }

    /// Opens `file_name` within `folder` for appending
    pub fn append(folder: &str, file_name: &str) -> Result<Self> {
        Self::open(folder, file_name, true)
    }

    fn open(folder: &str, file_name: &str, append: bool) -> Result<Self> {
        let relative_path = Path::new(&folder).join(file_name);

        if let Some(parent) = relative_path.parent() {
            create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directories for {:?}", parent))?;
        }

        let mut options = OpenOptions::new();
        if append {
            options.append(true).create(true);
        } else {
            options.write(true).create(true).truncate(true);
        }
        let file = options
            .open(&relative_path)
            .wrap_err_with(|| format!("Failed to open file: {:?}", relative_path))?;

        Ok(OutputFile {
            file,
            relative_path,
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_owned(self) -> File {
        self.file
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }
}
