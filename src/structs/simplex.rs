use eyre::{bail, Result};
use ndarray::{s, Array2, ArrayView1, ArrayView2, ArrayViewMut1};

/// Maps one row of unconstrained logits onto the probability simplex
///
/// The first `K - 1` entries of `mu` act as free logits, and the last column is the anchor with a fixed
/// logit of zero. The anchor is then swapped into the `pivot` column, so that any topic can play that role.
/// The entry `mu[K - 1]` does not take part in the transform.
///
/// The computation is shifted by the largest logit, so arbitrarily large entries of `mu` still produce a
/// valid distribution.
pub fn softmax_row(mu: ArrayView1<f64>, pivot: usize, mut theta: ArrayViewMut1<f64>) {
    let k = mu.len();
    let last = k - 1;

    let shift = mu
        .slice(s![..last])
        .fold(0.0_f64, |acc, &value| acc.max(value));
    let anchor = (-shift).exp();
    let denominator = anchor
        + mu
            .slice(s![..last])
            .iter()
            .map(|&value| (value - shift).exp())
            .sum::<f64>();

    for kp in 0..last {
        theta[kp] = (mu[kp] - shift).exp() / denominator;
    }
    theta[last] = anchor / denominator;
    theta.swap(last, pivot);
}

/// Holds the unconstrained topic logits `mu` and the topic proportions derived from them
///
/// `theta` is only ever written by [Simplex::update], which must be called after every change to `mu`.
#[derive(Debug, Clone)]
pub struct Simplex {
    mu: Array2<f64>,
    pivots: Vec<usize>,
    theta: Array2<f64>,
    theta_with_bias: Array2<f64>,
}

impl Simplex {
    /// Create the simplex state from initial logits and the per-document pivot columns
    pub fn new(mu: Array2<f64>, pivots: Vec<usize>) -> Result<Self> {
        let (ndocs, ntopics) = mu.dim();
        if ntopics == 0 {
            bail!("At least one topic is required");
        }
        if pivots.len() != ndocs {
            bail!(
                "Expected {} pivot columns, one per document, found {}",
                ndocs,
                pivots.len()
            );
        }
        if let Some(pivot) = pivots.iter().find(|&&p| p >= ntopics) {
            bail!("Pivot column {} is outside of {} topics", pivot, ntopics);
        }

        let mut simplex = Simplex {
            mu,
            pivots,
            theta: Array2::zeros((ndocs, ntopics)),
            theta_with_bias: Array2::ones((ndocs, ntopics + 1)),
        };
        simplex.update();
        Ok(simplex)
    }

    /// Recompute `theta` (and its bias-augmented copy) from `mu`
    pub fn update(&mut self) {
        let ntopics = self.ntopics();
        for (d, (mu_row, theta_row)) in self
            .mu
            .rows()
            .into_iter()
            .zip(self.theta.rows_mut())
            .enumerate()
        {
            softmax_row(mu_row, self.pivots[d], theta_row);
        }
        self.theta_with_bias
            .slice_mut(s![.., ..ntopics])
            .assign(&self.theta);
    }

    /// Adds `delta` to a single logit. The caller is responsible for calling [Simplex::update] afterwards.
    pub fn shift_mu(&mut self, d: usize, k: usize, delta: f64) {
        self.mu[[d, k]] += delta;
    }

    pub fn mu(&self) -> ArrayView2<f64> {
        self.mu.view()
    }

    pub fn theta(&self) -> ArrayView2<f64> {
        self.theta.view()
    }

    /// `theta` with an additional constant column of ones, used as regression design
    pub fn theta_with_bias(&self) -> ArrayView2<f64> {
        self.theta_with_bias.view()
    }

    pub fn ndocs(&self) -> usize {
        self.mu.nrows()
    }

    pub fn ntopics(&self) -> usize {
        self.mu.ncols()
    }
}
