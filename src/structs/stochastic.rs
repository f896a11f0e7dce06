use ndarray::{ArrayView2, Axis};
use ndarray_stats::QuantileExt;
use std::fmt;

/// A row of a stochastic matrix that is no longer a probability distribution
///
/// This signals a corrupted optimization state, and aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticViolation {
    pub matrix: String,
    pub row: usize,
    /// The offending column, if a single entry is out of range
    pub column: Option<usize>,
    /// The offending entry, or the row sum if `column` is `None`
    pub value: f64,
}

impl fmt::Display for StochasticViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(
                f,
                "{}[{}, {}] = {} is not a probability",
                self.matrix, self.row, column, self.value
            ),
            None => write!(
                f,
                "Row {} of {} sums to {}, not 1",
                self.row, self.matrix, self.value
            ),
        }
    }
}

impl std::error::Error for StochasticViolation {}

/// Checks that every row of `matrix` is a probability distribution within `epsilon`
///
/// Entries must lie within `[-epsilon, 1 + epsilon]`, and rows must sum to `1 ± epsilon`.
pub fn check_stochastic(
    name: &str,
    matrix: ArrayView2<f64>,
    epsilon: f64,
) -> Result<(), StochasticViolation> {
    for (r, row) in matrix.rows().into_iter().enumerate() {
        let mut sum = 0.0;
        for (c, &value) in row.iter().enumerate() {
            // NaN fails this check as well
            if !(-epsilon..=1.0 + epsilon).contains(&value) {
                return Err(StochasticViolation {
                    matrix: name.to_string(),
                    row: r,
                    column: Some(c),
                    value,
                });
            }
            sum += value;
        }
        let deviation = (1.0 - sum).abs();
        if deviation.is_nan() || deviation > epsilon {
            return Err(StochasticViolation {
                matrix: name.to_string(),
                row: r,
                column: None,
                value: sum,
            });
        }
    }
    Ok(())
}

/// Summary of how well the rows of a matrix behave as probability distributions
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSummary {
    pub invalid_rows: usize,
    pub average_sum: f64,
    pub min: f64,
    pub max: f64,
}

impl StochasticSummary {
    pub fn new(matrix: ArrayView2<f64>, epsilon: f64) -> Self {
        let sums = matrix.sum_axis(Axis(1));
        let invalid_rows = sums.iter().filter(|s| (1.0 - *s).abs() > epsilon).count();
        StochasticSummary {
            invalid_rows,
            average_sum: sums.mean().unwrap_or(f64::NAN),
            min: *matrix.min_skipnan(),
            max: *matrix.max_skipnan(),
        }
    }
}

impl fmt::Display for StochasticSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid count = {}, Average sum = {}, Max: {}, Min: {}",
            self.invalid_rows, self.average_sum, self.max, self.min
        )
    }
}
