use super::{sigmoid, GradientPoint, Link, LinkType, Regression};
use crate::routines::optimization::DerivativeSummary;
use eyre::Result;
use ndarray::{Array1, ArrayView1};

/// The outcome is a logistic function of the topic proportions, `c ≈ σ(thetaWithBias · v)`
///
/// There is no closed form for the weights, which are fitted by gradient ascent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Link for Sigmoid {
    fn link_type(&self) -> LinkType {
        LinkType::Sigmoid
    }

    fn predict(&self, theta_with_bias: ArrayView1<f64>, v: ArrayView1<f64>) -> f64 {
        sigmoid(theta_with_bias.dot(&v))
    }

    fn gradient_wrt_theta(&self, point: &GradientPoint) -> f64 {
        // The factor (1 - c_d) is kept as-is; the derivative of the sigmoid would suggest (1 - δ_d)
        let delta = point.prediction;
        let fit = point.lambda / point.ndocs
            * (point.outcome - delta)
            * delta
            * (1.0 - point.outcome)
            * point.weight;
        point.word_term - fit
    }

    /// Gradient ascent on the topic weights
    ///
    /// Each sweep builds a fresh weight vector in which only the topic weights are set, so the bias weight is
    /// zero after the first sweep. Every sweep scales `v_k` by `1 - rate·λ·K/η²` before the data term, and the
    /// weights diverge when that factor falls below -1.
    fn fit_weights(&self, problem: &Regression) -> Result<Array1<f64>> {
        tracing::debug!("Begin optimizing v with gradient ascent");
        let ntopics = problem.hyper.topics;
        let ndocs = problem.outcomes.len() as f64;
        let lambda = problem.hyper.lambda;
        let penalty = ntopics as f64 / problem.hyper.eta.powi(2);

        let mut v = match problem.previous {
            Some(previous) if previous.len() == ntopics + 1 => previous.to_owned(),
            _ => Array1::from_elem(ntopics + 1, 0.5),
        };

        let mut summary = DerivativeSummary::default();
        for _ in 0..problem.max_iterations {
            let deltas: Array1<f64> = problem
                .theta_with_bias
                .rows()
                .into_iter()
                .map(|row| self.predict(row, v.view()))
                .collect();

            let mut next = Array1::zeros(ntopics + 1);
            for k in 0..ntopics {
                let sum: f64 = deltas
                    .iter()
                    .zip(problem.outcomes.iter())
                    .zip(problem.theta_with_bias.column(k).iter())
                    .map(|((delta, c), theta)| (c - delta) * delta * (1.0 - delta) * theta)
                    .sum();
                let partial = lambda * (sum / ndocs - penalty * v[k]);
                next[k] = v[k] + problem.learning_rate * partial;
                summary.push(partial);
            }
            v = next;
        }

        tracing::debug!("V: {}", summary);
        tracing::debug!("Finished optimizing v with gradient ascent");
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::parameters::Hyperparameters;
    use ndarray::array;

    fn problem<'a>(
        design: &'a ndarray::Array2<f64>,
        outcomes: &'a Array1<f64>,
        lambda: f64,
        iterations: usize,
    ) -> Regression<'a> {
        Regression {
            theta_with_bias: design.view(),
            outcomes: outcomes.view(),
            hyper: Hyperparameters::new(2, lambda, 1.0),
            previous: None,
            max_iterations: iterations,
            learning_rate: 10.0,
        }
    }

    #[test]
    fn test_no_iterations_keeps_start() {
        let design = array![[0.5, 0.5, 1.0]];
        let outcomes = array![0.5];
        let v = Sigmoid.fit_weights(&problem(&design, &outcomes, 0.5, 0)).unwrap();
        assert_eq!(v, array![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_zero_lambda_keeps_topic_weights() {
        let design = array![[0.9, 0.1, 1.0], [0.2, 0.8, 1.0]];
        let outcomes = array![0.9, 0.1];
        let v = Sigmoid.fit_weights(&problem(&design, &outcomes, 0.0, 25)).unwrap();
        assert_eq!(v, array![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_bias_is_reset() {
        let design = array![[0.9, 0.1, 1.0], [0.2, 0.8, 1.0]];
        let outcomes = array![0.9, 0.1];
        let mut problem = problem(&design, &outcomes, 0.5, 3);
        let previous = array![0.1, -0.2, 0.7];
        problem.previous = Some(previous.view());
        let v = Sigmoid.fit_weights(&problem).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn test_default_rate_diverges() {
        // 1 - 10 · 0.5 · 2 = -9 per sweep
        let design = array![[0.9, 0.1, 1.0], [0.2, 0.8, 1.0]];
        let outcomes = array![0.9, 0.1];
        let v = Sigmoid.fit_weights(&problem(&design, &outcomes, 0.5, 10)).unwrap();
        assert!(v[0].abs() > 1e6);
        assert!(v[1].abs() > 1e6);
    }

    #[test]
    fn test_small_rate_stays_bounded() {
        // 1 - 0.5 · 0.5 · 2 = 0.5 per sweep
        let design = array![[0.9, 0.1, 1.0], [0.2, 0.8, 1.0]];
        let outcomes = array![0.9, 0.1];
        let mut problem = problem(&design, &outcomes, 0.5, 100);
        problem.learning_rate = 0.5;
        let v = Sigmoid.fit_weights(&problem).unwrap();
        assert!(v.iter().all(|w| w.abs() < 1.0));
    }

    #[test]
    fn test_single_sweep_matches_formula() {
        let design = array![[1.0, 0.0, 1.0]];
        let outcomes = array![1.0];
        let v = Sigmoid.fit_weights(&problem(&design, &outcomes, 1.0, 1)).unwrap();
        let delta = sigmoid(1.0);
        let partial = (1.0 - delta) * delta * (1.0 - delta) - 2.0 * 0.5;
        assert!((v[0] - (0.5 + 10.0 * partial)).abs() < 1e-12);
        // theta_d1 = 0, so only the penalty applies
        assert!((v[1] - (0.5 - 10.0)).abs() < 1e-12);
        assert_eq!(v[2], 0.0);
    }
}
