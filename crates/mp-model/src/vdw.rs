//! Van der Waals mixture model with analytic derivatives.

use crate::error::{ModelError, ModelResult};
use crate::model::ResidualModel;
use mp_core::GAS_CONSTANT;
use nalgebra::{DMatrix, DVector, DVectorView};

/// Van der Waals mixture in terms of component molar densities.
///
/// With `B = sum_i b_i rho_i` and the quadratic attraction term
/// `A2 = sum_ij a_ij rho_i rho_j`, the residual Helmholtz energy density is
///
/// ```text
/// Psir(T, rhovec) = -rho R T ln(1 - B) - A2
/// ```
///
/// which reproduces the familiar pressure `p = rho R T / (1 - b rho) - a rho²`
/// through the standard relation `p = rho R T - Psir + rhovec · grad(Psir)`.
/// All derivatives the `ResidualModel` trait requires are closed-form here.
#[derive(Clone, Debug)]
pub struct VdwMixture {
    /// Pairwise attraction parameters `a_ij` in J m³/mol²
    a: DMatrix<f64>,
    /// Covolumes `b_i` in m³/mol
    b: DVector<f64>,
}

impl VdwMixture {
    /// Build from per-component critical temperature [K] and pressure [Pa],
    /// with geometric-mean combining for the cross attraction `a_ij`.
    pub fn from_critical(tc: &[f64], pc: &[f64]) -> ModelResult<Self> {
        if tc.is_empty() || tc.len() != pc.len() {
            return Err(ModelError::InvalidArg {
                what: format!(
                    "critical constants length mismatch: {} Tc vs {} pc",
                    tc.len(),
                    pc.len()
                ),
            });
        }
        for (&t, &p) in tc.iter().zip(pc) {
            if t <= 0.0 || p <= 0.0 {
                return Err(ModelError::NonPhysical {
                    what: format!("critical constants must be positive, got Tc={t}, pc={p}"),
                });
            }
        }
        let n = tc.len();
        let r = GAS_CONSTANT;
        let ai: Vec<f64> = tc
            .iter()
            .zip(pc)
            .map(|(&t, &p)| 27.0 / 64.0 * r * r * t * t / p)
            .collect();
        let a = DMatrix::from_fn(n, n, |i, j| (ai[i] * ai[j]).sqrt());
        let b = DVector::from_iterator(n, tc.iter().zip(pc).map(|(&t, &p)| r * t / (8.0 * p)));
        Ok(Self { a, b })
    }

    pub fn n_components(&self) -> usize {
        self.b.len()
    }

    /// Packing fraction `B = sum_i b_i rho_i`; must stay below one.
    fn covolume_fraction(&self, rhovec: &DVectorView<'_, f64>) -> ModelResult<f64> {
        let bsum = self.b.dot(&rhovec.clone_owned());
        if bsum >= 1.0 {
            return Err(ModelError::NonPhysical {
                what: format!("covolume packing fraction {bsum} >= 1"),
            });
        }
        Ok(bsum)
    }
}

impl ResidualModel for VdwMixture {
    fn gas_constant(&self, _molefrac: &DVector<f64>) -> f64 {
        GAS_CONSTANT
    }

    fn psir_gradient_hessian(
        &self,
        t: f64,
        rhovec: DVectorView<'_, f64>,
    ) -> ModelResult<(f64, DVector<f64>, DMatrix<f64>)> {
        let n = self.b.len();
        if rhovec.len() != n {
            return Err(ModelError::InvalidArg {
                what: format!("rhovec has {} components, model has {n}", rhovec.len()),
            });
        }
        let bsum = self.covolume_fraction(&rhovec)?;
        let rho = rhovec.sum();
        let r = GAS_CONSTANT;
        let om = 1.0 - bsum;
        let ln_om = om.ln();

        // A2 = sum_ij a_ij rho_i rho_j and its half-gradient sum_j a_kj rho_j
        let mut a_rho = DVector::zeros(n);
        for kk in 0..n {
            let mut acc = 0.0;
            for jj in 0..n {
                acc += self.a[(kk, jj)] * rhovec[jj];
            }
            a_rho[kk] = acc;
        }
        let a2 = a_rho.dot(&rhovec.clone_owned());

        let psir = -rho * r * t * ln_om - a2;

        let mut grad = DVector::zeros(n);
        for kk in 0..n {
            grad[kk] = -r * t * ln_om + rho * r * t * self.b[kk] / om - 2.0 * a_rho[kk];
        }

        let mut hess = DMatrix::zeros(n, n);
        for kk in 0..n {
            for ll in 0..n {
                hess[(kk, ll)] = r * t * self.b[ll] / om + r * t * self.b[kk] / om
                    + rho * r * t * self.b[kk] * self.b[ll] / (om * om)
                    - 2.0 * self.a[(kk, ll)];
            }
        }
        Ok((psir, grad, hess))
    }

    fn ar10(&self, t: f64, rho: f64, molefrac: &DVector<f64>) -> ModelResult<f64> {
        let n = self.b.len();
        if molefrac.len() != n {
            return Err(ModelError::InvalidArg {
                what: format!("molefrac has {} components, model has {n}", molefrac.len()),
            });
        }
        // alphar = -ln(1 - B) - a_mix rho / (R T); only the attraction term
        // carries a 1/T, so -T d(alphar)/dT = -a_mix rho / (R T).
        let mut a_mix = 0.0;
        for i in 0..n {
            for j in 0..n {
                a_mix += self.a[(i, j)] * molefrac[i] * molefrac[j];
            }
        }
        Ok(-a_mix * rho / (GAS_CONSTANT * t))
    }

    // Psir is linear in T for this model, so the mixed derivative has no T in it.
    fn d2psir_dt_drho(&self, _t: f64, rhovec: DVectorView<'_, f64>) -> ModelResult<DVector<f64>> {
        let n = self.b.len();
        if rhovec.len() != n {
            return Err(ModelError::InvalidArg {
                what: format!("rhovec has {} components, model has {n}", rhovec.len()),
            });
        }
        let bsum = self.covolume_fraction(&rhovec)?;
        let rho = rhovec.sum();
        let r = GAS_CONSTANT;
        let om = 1.0 - bsum;
        let ln_om = om.ln();
        let mut out = DVector::zeros(n);
        for kk in 0..n {
            out[kk] = -r * ln_om + rho * r * self.b[kk] / om;
        }
        Ok(out)
    }
}
