use super::DerivativeSummary;
use crate::routines::regression::{GradientPoint, Link};
use crate::structs::{simplex::Simplex, statistics::Statistics};
use ndarray::{Array1, Array2, ArrayView1};

/// Gradient ascent on the unconstrained topic logits `mu`
///
/// Every pass moves each `mu[d, k]` along the partial derivative of the joint likelihood, obtained by the
/// chain rule through the softmax transform, and then recomputes `theta`.
#[derive(Debug)]
pub struct SimplexOptimizer<'a> {
    pub link: &'a dyn Link,
    pub lambda: f64,
    /// Total number of words in the corpus, `T`
    pub total_words: f64,
    pub smoothing: f64,
    /// Number of passes over the documents
    pub passes: usize,
    pub training: bool,
}

impl SimplexOptimizer<'_> {
    /// Runs all passes with the given step size, returning statistics on the partial derivatives
    pub fn optimize(
        &self,
        simplex: &mut Simplex,
        statistics: &Statistics,
        outcomes: ArrayView1<f64>,
        v: ArrayView1<f64>,
        step: f64,
    ) -> DerivativeSummary {
        let mut summary = DerivativeSummary::default();
        let ntopics = simplex.ntopics();

        for _ in 0..self.passes {
            // theta stays fixed during a pass, so each gradient is computed once per pass
            let gradients = self.theta_gradients(simplex, statistics, outcomes, v);

            for d in 0..simplex.ndocs() {
                let theta = simplex.theta().row(d).to_owned();
                for k in 0..ntopics {
                    let derivative: f64 = (0..ntopics)
                        .map(|kp| gradients[[d, kp]] * theta_wrt_mu(&theta, k, kp))
                        .sum();
                    simplex.shift_mu(d, k, step * derivative);
                    summary.push(derivative);
                }
            }

            simplex.update();
        }

        tracing::debug!("Theta: {}", summary);
        tracing::debug!("Theta: Next step size = {}", step);
        summary
    }

    /// Partial derivatives of the joint likelihood with respect to every entry of `theta` (N×K)
    pub fn theta_gradients(
        &self,
        simplex: &Simplex,
        statistics: &Statistics,
        outcomes: ArrayView1<f64>,
        v: ArrayView1<f64>,
    ) -> Array2<f64> {
        let theta = simplex.theta();
        let predictions: Array1<f64> = self.link.predictions(simplex.theta_with_bias(), v);
        let ndocs = simplex.ndocs() as f64;
        let word_weight = (1.0 - self.lambda) / self.total_words;

        Array2::from_shape_fn(theta.dim(), |(d, k)| {
            let theta_dk = theta[[d, k]];
            let point = GradientPoint {
                word_term: word_weight * statistics.e_dk[[d, k]] / (theta_dk + self.smoothing),
                lambda: self.lambda,
                ndocs,
                outcome: outcomes[d],
                prediction: predictions[d],
                theta: theta_dk,
                weight: v[k],
                training: self.training,
            };
            self.link.gradient_wrt_theta(&point)
        })
    }
}

/// Derivative of `theta[kp]` with respect to the logit `mu[k]`
fn theta_wrt_mu(theta: &Array1<f64>, k: usize, kp: usize) -> f64 {
    if k == kp {
        theta[k] * (1.0 - theta[k])
    } else {
        -theta[kp] * theta[k]
    }
}
