use crate::structs::{corpus::Corpus, parameters::Hyperparameters};
use eyre::{Result, WrapErr};
use ndarray::{s, ArrayView1, ArrayView2};
use ndarray_stats::DeviationExt;

/// Average log-probability of a word of the corpus under the model
///
/// `(1 / T) · Σ_d Σ_w count · log(Σ_k theta[d, k] · beta[k, w])`
pub fn topic_likelihood(corpus: &Corpus, theta: ArrayView2<f64>, beta: ArrayView2<f64>) -> f64 {
    let mut total = 0.0;
    for (d, document) in corpus.documents().iter().enumerate() {
        let row = theta.row(d);
        for word in document.words() {
            let probability = row.dot(&beta.column(word.id));
            total += word.count as f64 * probability.ln();
        }
    }
    total / corpus.total_word_count() as f64
}

/// Sum of squared differences between predicted and observed outcomes
pub fn sum_squared_error(predictions: ArrayView1<f64>, outcomes: ArrayView1<f64>) -> Result<f64> {
    predictions
        .sq_l2_dist(&outcomes)
        .wrap_err("Predictions and outcomes differ in length")
}

/// Penalized squared error of the regression, `SSE / 2N + (1 / 2Kη²) · Σ_{k<K} v_k²`
///
/// The bias weight is not penalized.
pub fn outcome_likelihood(sse: f64, ndocs: usize, hyper: &Hyperparameters, v: ArrayView1<f64>) -> f64 {
    let penalty = v.slice(s![..hyper.topics]).mapv(|w| w * w).sum();
    sse / (2.0 * ndocs as f64) + hyper.ridge() / 2.0 * penalty
}

pub fn perplexity(topic_likelihood: f64) -> f64 {
    (-topic_likelihood).exp()
}

pub fn rmse(sse: f64, ndocs: usize) -> f64 {
    (sse / ndocs as f64).sqrt()
}

/// Every quantity tracked at the end of an iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Likelihood {
    pub topic: f64,
    pub outcome: f64,
    /// The objective that drives convergence
    pub joint: f64,
    pub perplexity: f64,
    pub rmse: f64,
}

impl Likelihood {
    /// Combines the word and outcome terms
    ///
    /// Training maximizes `(1 - λ) · topic - λ · outcome`, while evaluation only tracks the topic term.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        corpus: &Corpus,
        theta: ArrayView2<f64>,
        beta: ArrayView2<f64>,
        predictions: ArrayView1<f64>,
        outcomes: ArrayView1<f64>,
        hyper: &Hyperparameters,
        v: ArrayView1<f64>,
        training: bool,
    ) -> Result<Self> {
        let topic = topic_likelihood(corpus, theta, beta);
        let sse = sum_squared_error(predictions, outcomes)?;
        let ndocs = outcomes.len();
        let outcome = outcome_likelihood(sse, ndocs, hyper, v);
        let joint = if training {
            (1.0 - hyper.lambda) * topic - hyper.lambda * outcome
        } else {
            topic
        };

        Ok(Likelihood {
            topic,
            outcome,
            joint,
            perplexity: perplexity(topic),
            rmse: rmse(sse, ndocs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::corpus::Document;
    use ndarray::array;

    fn corpus() -> Corpus {
        let documents = vec![
            Document::parse("0:2 1:2").unwrap(),
            Document::parse("1:1").unwrap(),
        ];
        Corpus::new(documents, 2).unwrap()
    }

    #[test]
    fn test_uniform_model() {
        let theta = array![[0.5, 0.5], [0.5, 0.5]];
        let beta = array![[0.5, 0.5], [0.5, 0.5]];
        let topic = topic_likelihood(&corpus(), theta.view(), beta.view());
        assert!((topic - 0.5_f64.ln()).abs() < 1e-12);
        assert!((perplexity(topic) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_perplexity_at_least_one() {
        let theta = array![[0.9, 0.1], [0.3, 0.7]];
        let beta = array![[0.8, 0.2], [0.1, 0.9]];
        let topic = topic_likelihood(&corpus(), theta.view(), beta.view());
        assert!(topic <= 0.0);
        assert!(perplexity(topic) >= 1.0);
    }

    #[test]
    fn test_outcome_terms() {
        let predictions = array![0.5, 1.0];
        let outcomes = array![0.0, 1.0];
        let sse = sum_squared_error(predictions.view(), outcomes.view()).unwrap();
        assert!((sse - 0.25).abs() < 1e-12);
        assert!((rmse(sse, 2) - 0.125_f64.sqrt()).abs() < 1e-12);

        let hyper = Hyperparameters::new(2, 0.5, 1.0);
        let v = array![1.0, 1.0, 100.0];
        // 0.25 / 4 + 1 / 4 · 2, the bias is not penalized
        let outcome = outcome_likelihood(sse, 2, &hyper, v.view());
        assert!((outcome - 0.5625).abs() < 1e-12);
    }

    #[test]
    fn test_evaluation_ignores_outcomes() {
        let theta = array![[0.5, 0.5], [0.5, 0.5]];
        let beta = array![[0.5, 0.5], [0.5, 0.5]];
        let hyper = Hyperparameters::new(2, 0.5, 1.0);
        let v = array![1.0, 1.0, 0.0];
        let predictions = array![1.0, 1.0];
        let outcomes = array![0.0, 0.0];

        let evaluation = Likelihood::compute(
            &corpus(),
            theta.view(),
            beta.view(),
            predictions.view(),
            outcomes.view(),
            &hyper,
            v.view(),
            false,
        )
        .unwrap();
        assert_eq!(evaluation.joint, evaluation.topic);
        assert!((evaluation.rmse - 1.0).abs() < 1e-12);

        let training = Likelihood::compute(
            &corpus(),
            theta.view(),
            beta.view(),
            predictions.view(),
            outcomes.view(),
            &hyper,
            v.view(),
            true,
        )
        .unwrap();
        assert!(training.joint < evaluation.joint);
    }

    #[test]
    fn test_length_mismatch() {
        let predictions = array![0.5];
        let outcomes = array![0.0, 1.0];
        assert!(sum_squared_error(predictions.view(), outcomes.view()).is_err());
    }
}
