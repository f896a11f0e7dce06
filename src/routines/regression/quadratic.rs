use super::{ridge::ridge_regression, GradientPoint, Link, LinkType, Regression};
use eyre::Result;
use ndarray::{Array1, ArrayView1};

/// The outcome is a linear function of the squared topic proportions, `c ≈ thetaWithBias² · v`
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl Link for Quadratic {
    fn link_type(&self) -> LinkType {
        LinkType::Quadratic
    }

    fn predict(&self, theta_with_bias: ArrayView1<f64>, v: ArrayView1<f64>) -> f64 {
        theta_with_bias
            .iter()
            .zip(v.iter())
            .map(|(theta, weight)| theta * theta * weight)
            .sum()
    }

    /// The outcome term only applies while training
    fn gradient_wrt_theta(&self, point: &GradientPoint) -> f64 {
        let fit = if point.training {
            point.lambda / point.ndocs
                * 2.0
                * (point.prediction - point.outcome)
                * point.theta
                * point.weight
        } else {
            0.0
        };
        point.word_term - fit
    }

    fn fit_weights(&self, problem: &Regression) -> Result<Array1<f64>> {
        tracing::debug!("Begin optimizing v with quadratic regression");
        let squared = problem.theta_with_bias.mapv(|theta| theta * theta);
        let v = ridge_regression(squared.view(), problem.outcomes, problem.hyper.ridge())?;
        tracing::debug!("Finished optimizing v with quadratic regression");
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_quadratic_prediction() {
        let row = array![0.5, 0.5, 1.0];
        let v = array![4.0, 2.0, 0.1];
        assert!((Quadratic.predict(row.view(), v.view()) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_outcome_term_only_when_training() {
        let mut point = GradientPoint {
            word_term: 0.5,
            lambda: 1.0,
            ndocs: 1.0,
            outcome: 0.0,
            prediction: 1.0,
            theta: 0.5,
            weight: 1.0,
            training: false,
        };
        assert_eq!(Quadratic.gradient_wrt_theta(&point), 0.5);
        point.training = true;
        assert!((Quadratic.gradient_wrt_theta(&point) + 0.5).abs() < 1e-12);
    }
}
