use super::{ridge::ridge_regression, GradientPoint, Link, LinkType, Regression};
use eyre::Result;
use ndarray::{Array1, ArrayView1};

/// The outcome is a linear function of the topic proportions, `c ≈ thetaWithBias · v`
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl Link for Linear {
    fn link_type(&self) -> LinkType {
        LinkType::Linear
    }

    fn predict(&self, theta_with_bias: ArrayView1<f64>, v: ArrayView1<f64>) -> f64 {
        theta_with_bias.dot(&v)
    }

    fn gradient_wrt_theta(&self, point: &GradientPoint) -> f64 {
        let fit = point.lambda / point.ndocs * (point.prediction - point.outcome) * point.weight;
        point.word_term - fit
    }

    fn fit_weights(&self, problem: &Regression) -> Result<Array1<f64>> {
        tracing::debug!("Begin optimizing v with linear regression");
        let v = ridge_regression(
            problem.theta_with_bias,
            problem.outcomes,
            problem.hyper.ridge(),
        )?;
        tracing::debug!("Finished optimizing v with linear regression");
        Ok(v)
    }
}
