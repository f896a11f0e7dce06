use eyre::{bail, Result, WrapErr};
use ndarray::{Array1, ArrayView1};
use std::fs;
use std::path::Path;

/// The observed outcome `c` of each document, aligned by document order
#[derive(Debug, Clone, PartialEq)]
pub struct Outcomes {
    values: Array1<f64>,
}

impl Outcomes {
    pub fn new(values: Array1<f64>) -> Self {
        let outside = values.iter().filter(|c| !(0.0..=1.0).contains(*c)).count();
        if outside > 0 {
            tracing::warn!(
                "{} of {} outcomes are outside of [0, 1]",
                outside,
                values.len()
            );
        }
        Outcomes { values }
    }

    /// Parse outcomes from text, one value per non-empty line
    pub fn parse(content: &str) -> Result<Self> {
        let values = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                line.trim()
                    .parse::<f64>()
                    .wrap_err_with(|| format!("Malformed outcome on line {}", index + 1))
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Outcomes::new(Array1::from(values)))
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Unable to read outcomes from {:?}", path))?;
        Self::parse(&content).wrap_err_with(|| format!("In file {:?}", path))
    }

    /// Checks that there is exactly one outcome per document
    pub fn check_aligned(&self, ndocs: usize) -> Result<()> {
        if self.values.len() != ndocs {
            bail!(
                "Found {} outcomes for {} documents",
                self.values.len(),
                ndocs
            );
        }
        Ok(())
    }

    pub fn values(&self) -> ArrayView1<f64> {
        self.values.view()
    }

    pub fn get(&self, d: usize) -> f64 {
        self.values[d]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f64>> for Outcomes {
    fn from(values: Vec<f64>) -> Self {
        Outcomes::new(Array1::from(values))
    }
}
