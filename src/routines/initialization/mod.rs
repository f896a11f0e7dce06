//! Random starting points of a run
//!
//! A single [StdRng] is seeded once per sweep and handed to every run, so a sweep is reproducible from its
//! seed while each combination still starts from a different point.

use eyre::{bail, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Standard normal logits for every document and topic (N×K)
pub fn gaussian_logits(rng: &mut StdRng, ndocs: usize, ntopics: usize) -> Array2<f64> {
    Array2::from_shape_simple_fn((ndocs, ntopics), || rng.sample(StandardNormal))
}

/// Draws the fixed pivot column of every document, uniformly in `[0, K)`
pub fn pivots(rng: &mut StdRng, ndocs: usize, ntopics: usize) -> Result<Vec<usize>> {
    if ntopics == 0 {
        bail!("At least one topic is required");
    }
    Ok((0..ndocs).map(|_| rng.gen_range(0..ntopics)).collect())
}

/// A random row-stochastic matrix, with entries drawn from `U[1, 2)` before normalization
pub fn stochastic_matrix(rng: &mut StdRng, nrows: usize, ncols: usize) -> Array2<f64> {
    let mut matrix = Array2::from_shape_simple_fn((nrows, ncols), || rng.gen::<f64>() + 1.0);
    for mut row in matrix.rows_mut() {
        let sum = row.sum();
        row.mapv_inplace(|value| value / sum);
    }
    matrix
}
