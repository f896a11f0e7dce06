use eyre::{bail, Result, WrapErr};
use linfa_linalg::{
    cholesky::Cholesky,
    triangular::{SolveTriangular, UPLO},
};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Number of times the ridge is increased before giving up on a singular system
const MAX_ATTEMPTS: usize = 10;

/// Solves the ridge regression `(XᵀX + ridge·I) v = Xᵀy` by Cholesky decomposition
///
/// The ridge is added to every diagonal entry, including the one of a bias column.
/// If the system is not positive definite, the ridge is increased tenfold and the decomposition retried.
pub fn ridge_regression(x: ArrayView2<f64>, y: ArrayView1<f64>, ridge: f64) -> Result<Array1<f64>> {
    if x.nrows() != y.len() {
        bail!(
            "The design has {} rows, but there are {} outcomes",
            x.nrows(),
            y.len()
        );
    }

    let xtx = x.t().dot(&x);
    let xty = x.t().dot(&y).insert_axis(Axis(1));

    let mut ridge = ridge;
    for _ in 0..MAX_ATTEMPTS {
        let mut system = xtx.clone();
        system.diag_mut().mapv_inplace(|d| d + ridge);

        match system.cholesky() {
            Ok(lower) => {
                let z = lower
                    .solve_triangular(&xty, UPLO::Lower)
                    .wrap_err("Forward substitution failed")?;
                let solution = lower
                    .t()
                    .solve_triangular(&z, UPLO::Upper)
                    .wrap_err("Backward substitution failed")?;
                return Ok(solution.column(0).to_owned());
            }
            Err(error) => {
                tracing::debug!(
                    "Ridge system with ridge {} is not positive definite ({}), increasing ridge",
                    ridge,
                    error
                );
                ridge = if ridge > 0.0 { ridge * 10.0 } else { 1e-8 };
            }
        }
    }

    bail!(
        "Unable to solve the ridge regression after {} attempts (final ridge {})",
        MAX_ATTEMPTS,
        ridge
    )
}
