use super::matrix::{write_matrix, write_vector};
use super::report::top_words_report;
use super::{Completion, Diagnostics, OutputFile, ProgressPoint, RunInfo, Snapshot};
use eyre::{Result, WrapErr};
use std::io::Write;

/// The traces appended to at every iteration
const TRACES: [&str; 3] = ["rmse", "likelihood", "perplexity"];

/// Writes the progress and snapshots of every run into the output folder
#[derive(Debug, Clone)]
pub struct FileSink {
    folder: String,
    vocabulary: Option<Vec<String>>,
    top_words: usize,
}

impl FileSink {
    pub fn new(folder: impl Into<String>, vocabulary: Option<Vec<String>>, top_words: usize) -> Self {
        FileSink {
            folder: folder.into(),
            vocabulary,
            top_words,
        }
    }

    fn append(&self, name: &str, value: f64) -> Result<()> {
        let outputfile = OutputFile::append(&self.folder, name)?;
        let mut file = outputfile.file();
        writeln!(file, "{}", value)
            .wrap_err_with(|| format!("Failed to append to {:?}", outputfile.relative_path()))?;
        Ok(())
    }
}

impl Diagnostics for FileSink {
    fn begin(&mut self, run: &RunInfo) -> Result<()> {
        for trace in TRACES {
            OutputFile::new(&self.folder, &run.file_name(trace, None))?;
        }
        Ok(())
    }

    fn progress(&mut self, run: &RunInfo, point: &ProgressPoint) -> Result<()> {
        self.append(&run.file_name("rmse", None), point.rmse)?;
        self.append(&run.file_name("likelihood", None), point.likelihood)?;
        self.append(&run.file_name("perplexity", None), point.perplexity)?;
        Ok(())
    }

    fn snapshot(&mut self, run: &RunInfo, label: &str, snapshot: &Snapshot) -> Result<()> {
        tracing::debug!("Writing {} snapshot to {}", label, self.folder);

        let outputfile = OutputFile::new(&self.folder, &run.file_name("beta", Some(label)))?;
        write_matrix(outputfile.file(), snapshot.beta).wrap_err("Failed to write beta")?;

        let outputfile = OutputFile::new(&self.folder, &run.file_name("theta", Some(label)))?;
        write_matrix(outputfile.file(), snapshot.theta).wrap_err("Failed to write theta")?;

        if let Some(v) = snapshot.v {
            let outputfile = OutputFile::new(&self.folder, &run.file_name("v", Some(label)))?;
            write_vector(outputfile.file(), v).wrap_err("Failed to write v")?;
        }

        let report = top_words_report(
            snapshot.beta,
            snapshot.v,
            self.vocabulary.as_deref(),
            self.top_words,
        );
        let outputfile = OutputFile::new(&self.folder, &run.file_name("top_words", Some(label)))?;
        outputfile
            .file()
            .write_all(report.as_bytes())
            .wrap_err("Failed to write the top words")?;
        Ok(())
    }

    fn finish(&mut self, run: &RunInfo, completion: &Completion) -> Result<()> {
        if run.purpose.is_training() {
            return Ok(());
        }

        let outputfile = OutputFile::new(&self.folder, &run.file_name("predicted_outcomes", None))?;
        write_vector(outputfile.file(), completion.predictions)
            .wrap_err("Failed to write the predicted outcomes")?;

        let outputfile = OutputFile::new(&self.folder, &run.file_name("predicted_rmse", None))?;
        writeln!(outputfile.file(), "{}", completion.rmse)
            .wrap_err("Failed to write the predicted RMSE")?;
        Ok(())
    }
}
