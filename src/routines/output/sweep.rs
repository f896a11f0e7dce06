use super::OutputFile;
use crate::algorithms::Status;
use crate::structs::parameters::Hyperparameters;
use csv::WriterBuilder;
use eyre::Result;
use serde::Serialize;

/// Summary of one combination of the sweep
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepRecord {
    pub k: usize,
    pub lambda: f64,
    pub eta: f64,
    pub status: String,
    /// Iterations of the training run
    pub iterations: Option<usize>,
    pub training_rmse: Option<f64>,
    pub evaluation_rmse: Option<f64>,
    pub evaluation_perplexity: Option<f64>,
}

impl SweepRecord {
    pub fn completed(
        hyper: &Hyperparameters,
        status: &Status,
        iterations: usize,
        training_rmse: f64,
        evaluation_rmse: f64,
        evaluation_perplexity: f64,
    ) -> Self {
        SweepRecord {
            k: hyper.topics,
            lambda: hyper.lambda,
            eta: hyper.eta,
            status: status.to_string(),
            iterations: Some(iterations),
            training_rmse: Some(training_rmse),
            evaluation_rmse: Some(evaluation_rmse),
            evaluation_perplexity: Some(evaluation_perplexity),
        }
    }

    pub fn failed(hyper: &Hyperparameters, error: &eyre::Report) -> Self {
        SweepRecord {
            k: hyper.topics,
            lambda: hyper.lambda,
            eta: hyper.eta,
            status: Status::Failed(error.to_string()).to_string(),
            iterations: None,
            training_rmse: None,
            evaluation_rmse: None,
            evaluation_perplexity: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.iterations.is_none()
    }
}

/// Holds the summaries of every combination visited by a sweep
#[derive(Debug, Clone, Default)]
pub struct SweepLog {
    records: Vec<SweepRecord>,
}

impl SweepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: SweepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SweepRecord] {
        &self.records
    }

    /// The completed combination with the lowest evaluation RMSE
    pub fn best(&self) -> Option<&SweepRecord> {
        self.records
            .iter()
            .filter(|r| r.evaluation_rmse.is_some_and(|rmse| rmse.is_finite()))
            .min_by(|a, b| {
                a.evaluation_rmse
                    .partial_cmp(&b.evaluation_rmse)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Writes `sweep.csv` to the output folder
    pub fn write(&self, folder: &str) -> Result<()> {
        tracing::debug!("Writing sweep summary...");
        let outputfile = OutputFile::new(folder, "sweep.csv")?;
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_writer(outputfile.file());
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        tracing::debug!("Sweep summary written to {:?}", outputfile.relative_path());
        Ok(())
    }
}
