//! Finite difference Jacobian for validating the analytic assembly.

use crate::assemble::PhaseEquilibrium;
use crate::error::{EquilibriumError, EquilibriumResult};
use nalgebra::{DMatrix, DVector};

/// Default perturbation where the caller's step vector has a zero entry.
const DEFAULT_STEP: f64 = 1e-6;

/// Recompute the Jacobian at `x` by central finite differences of the
/// residual, one column per variable with step `dx[i]`.
///
/// Costs `2 * n` residual evaluations and clobbers the system's internal
/// buffers; verification only, not for the production evaluation path.
pub fn central_difference_jacobian(
    system: &mut PhaseEquilibrium<'_>,
    x: &DVector<f64>,
    dx: &DVector<f64>,
) -> EquilibriumResult<DMatrix<f64>> {
    let n = system.n_independent();
    if x.len() != n {
        return Err(EquilibriumError::InputSize {
            expected: n,
            actual: x.len(),
        });
    }
    if dx.len() != n {
        return Err(EquilibriumError::InputSize {
            expected: n,
            actual: dx.len(),
        });
    }

    let mut jac = DMatrix::zeros(n, n);
    for i in 0..n {
        let step = if dx[i] != 0.0 { dx[i] } else { DEFAULT_STEP };

        let mut x_plus = x.clone();
        x_plus[i] += step;
        let r_plus = system.evaluate(&x_plus)?.r.clone();

        let mut x_minus = x.clone();
        x_minus[i] -= step;
        let r_minus = system.evaluate(&x_minus)?.r.clone();

        jac.set_column(i, &((r_plus - r_minus) / (2.0 * step)));
    }
    Ok(jac)
}
