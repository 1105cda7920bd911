//! Residual and Jacobian assembly for the equilibrium system.

use crate::error::{EquilibriumError, EquilibriumResult};
use crate::spec::{Sidecar, Specification};
use crate::variables::{n_independent, PhaseVariables};
use mp_model::ResidualModel;
use nalgebra::{DMatrix, DVector, DVectorView};
use tracing::{debug, trace};

/// Residual vector and Jacobian from one evaluation.
///
/// Owned by the [`PhaseEquilibrium`] and overwritten in place on every call;
/// the borrow returned by [`PhaseEquilibrium::evaluate`] is valid until the
/// next call, which the borrow checker enforces.
#[derive(Clone, Debug)]
pub struct CallResult {
    pub r: DVector<f64>,
    pub j: DMatrix<f64>,
}

/// Derivatives of the residual Helmholtz energy density for one phase.
struct PhaseDerivatives {
    psir: f64,
    grad: DVector<f64>,
    hess: DMatrix<f64>,
    dpsir_dt: f64,
    dgrad_dt: DVector<f64>,
}

/// Multiphase equilibrium system with a fixed variable layout.
///
/// The unknown vector is `[T, rho(phase 0), ..., rho(phase Np-1), beta_0,
/// ..., beta_{Np-1}]`. Rows are assembled in a fixed order: `Ncomp` fugacity
/// equality rows per phase beyond the first, one pressure equality row per
/// phase beyond the first, `Ncomp - 1` mass balance rows, one normalization
/// row, and the two specification rows.
///
/// The model and bulk composition are borrowed for the lifetime of the
/// system. One instance serves one equilibrium problem; it is not usable
/// concurrently because its result buffers are reused across calls.
pub struct PhaseEquilibrium<'a> {
    model: &'a dyn ResidualModel,
    zbulk: &'a DVector<f64>,
    n_components: usize,
    n_phases: usize,
    n_independent: usize,
    specifications: Vec<Box<dyn Specification>>,
    res: CallResult,
}

impl<'a> PhaseEquilibrium<'a> {
    /// Build a system for the dimensions implied by `init`.
    ///
    /// Fails if the phase-fraction count differs from the number of density
    /// vectors, if the density vectors are empty or ragged, if the bulk
    /// composition has the wrong length, if the number of specification
    /// equations is not exactly two, or if a specification rejects the
    /// problem dimensions.
    pub fn new(
        model: &'a dyn ResidualModel,
        zbulk: &'a DVector<f64>,
        init: &PhaseVariables,
        specifications: Vec<Box<dyn Specification>>,
    ) -> EquilibriumResult<Self> {
        let n_phases = init.betas.len();
        if init.rhovecs.len() != n_phases {
            return Err(EquilibriumError::Construction {
                what: format!(
                    "{} density vectors for {} phase fractions",
                    init.rhovecs.len(),
                    n_phases
                ),
            });
        }
        let n_components = init.rhovecs.first().map_or(0, |r| r.len());
        if n_components == 0 {
            return Err(EquilibriumError::Construction {
                what: "need at least one phase with a nonempty density vector".into(),
            });
        }
        if init.rhovecs.iter().any(|r| r.len() != n_components) {
            return Err(EquilibriumError::Construction {
                what: "density vectors differ in length across phases".into(),
            });
        }
        if zbulk.len() != n_components {
            return Err(EquilibriumError::Construction {
                what: format!(
                    "bulk composition has {} entries for {} components",
                    zbulk.len(),
                    n_components
                ),
            });
        }
        if specifications.len() != 2 {
            return Err(EquilibriumError::Construction {
                what: format!(
                    "need exactly 2 specification equations, got {}",
                    specifications.len()
                ),
            });
        }
        for spec in &specifications {
            spec.validate(n_components, n_phases)?;
        }
        let ni = n_independent(n_components, n_phases);
        debug!(
            n_components,
            n_phases,
            n_independent = ni,
            "constructed phase equilibrium system"
        );
        Ok(Self {
            model,
            zbulk,
            n_components,
            n_phases,
            n_independent: ni,
            specifications,
            res: CallResult {
                r: DVector::zeros(ni),
                j: DMatrix::zeros(ni, ni),
            },
        })
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn n_phases(&self) -> usize {
        self.n_phases
    }

    pub fn n_independent(&self) -> usize {
        self.n_independent
    }

    /// Assemble the residual vector and Jacobian at the trial point `x`.
    ///
    /// The returned borrow aliases internal buffers that the next call
    /// overwrites. Components with zero or near-zero density are not masked;
    /// their logarithmic terms make the Jacobian ill-conditioned there, and
    /// handling that is left to the driving solver.
    pub fn evaluate(&mut self, x: &DVector<f64>) -> EquilibriumResult<&CallResult> {
        let nc = self.n_components;
        let np = self.n_phases;
        let ni = self.n_independent;
        if x.len() != ni {
            return Err(EquilibriumError::InputSize {
                expected: ni,
                actual: x.len(),
            });
        }

        let t = x[0];
        let rho_views: Vec<DVectorView<'_, f64>> =
            (0..np).map(|ip| x.rows(1 + ip * nc, nc)).collect();
        let betas = x.rows(ni - np, np);
        // One gas constant for the bulk composition; phases with differing R
        // values are not handled and are assumed identical.
        let r_gas = self.model.gas_constant(self.zbulk);

        let mut ders: Vec<PhaseDerivatives> = Vec::with_capacity(np);
        for ip in 0..np {
            let rhovec = rho_views[ip];
            let (psir, grad, hess) = self.model.psir_gradient_hessian(t, rhovec)?;
            let rho = rhovec.sum();
            let molefrac = rhovec.clone_owned() / rho;
            let ar10 = self.model.ar10(t, rho, &molefrac)?;
            // Psir = rho R T alphar, so dPsir/dT = rho R (T dalphar/dT) + Psir/T
            // and T dalphar/dT = -Ar10.
            let dpsir_dt = rho * r_gas * (-ar10) + psir / t;
            let dgrad_dt = self.model.d2psir_dt_drho(t, rhovec)?;
            ders.push(PhaseDerivatives {
                psir,
                grad,
                hess,
                dpsir_dt,
                dgrad_dt,
            });
        }

        // ln f_i = ln(rho_i R T) + grad_i/(R T), with its T- and
        // density-derivatives, per phase.
        let mut lnf: Vec<DVector<f64>> = Vec::with_capacity(np);
        let mut dlnf_dt: Vec<DVector<f64>> = Vec::with_capacity(np);
        let mut dlnf_drho: Vec<DMatrix<f64>> = Vec::with_capacity(np);
        for ip in 0..np {
            let rhovec = rho_views[ip];
            let d = &ders[ip];
            let mut lnf_p = DVector::zeros(nc);
            let mut dt_p = DVector::zeros(nc);
            let mut drho_p = DMatrix::zeros(nc, nc);
            for ic in 0..nc {
                lnf_p[ic] = (rhovec[ic] * r_gas * t).ln() + d.grad[ic] / (r_gas * t);
                dt_p[ic] =
                    1.0 / t + d.dgrad_dt[ic] / (r_gas * t) - d.grad[ic] / (r_gas * t * t);
                for jc in 0..nc {
                    let mut v = d.hess[(ic, jc)] / (r_gas * t);
                    if ic == jc {
                        v += 1.0 / rhovec[ic];
                    }
                    drho_p[(ic, jc)] = v;
                }
            }
            lnf.push(lnf_p);
            dlnf_dt.push(dt_p);
            dlnf_drho.push(drho_p);
        }

        // p = rho R T - Psir + rhovec . grad, with derivatives, per phase.
        let mut p = Vec::with_capacity(np);
        let mut dp_dt = Vec::with_capacity(np);
        let mut dp_drho: Vec<DVector<f64>> = Vec::with_capacity(np);
        for ip in 0..np {
            let rhovec = rho_views[ip];
            let d = &ders[ip];
            let rho = rhovec.sum();
            p.push(rho * r_gas * t - d.psir + rhovec.dot(&d.grad));
            dp_dt.push(rho * r_gas - d.dpsir_dt + rhovec.dot(&d.dgrad_dt));
            let mut dpdrho_p = DVector::zeros(nc);
            for kc in 0..nc {
                let mut acc = r_gas * t;
                for ic in 0..nc {
                    acc += rhovec[ic] * d.hess[(ic, kc)];
                }
                dpdrho_p[kc] = acc;
            }
            dp_drho.push(dpdrho_p);
        }

        let r = &mut self.res.r;
        let j = &mut self.res.j;
        r.fill(0.0);
        j.fill(0.0);
        let mut irow = 0;

        // Fugacity equality of phase 0 against each further phase.
        for ip in 1..np {
            for ic in 0..nc {
                r[irow + ic] = lnf[0][ic] - lnf[ip][ic];
                j[(irow + ic, 0)] = dlnf_dt[0][ic] - dlnf_dt[ip][ic];
                for jc in 0..nc {
                    j[(irow + ic, 1 + jc)] = dlnf_drho[0][(ic, jc)];
                    j[(irow + ic, 1 + ip * nc + jc)] = -dlnf_drho[ip][(ic, jc)];
                }
            }
            irow += nc;
        }

        // Pressure equality of phase 0 against each further phase. No
        // dependence on the phase fractions.
        for ip in 1..np {
            r[irow] = p[0] - p[ip];
            j[(irow, 0)] = dp_dt[0] - dp_dt[ip];
            for jc in 0..nc {
                j[(irow, 1 + jc)] = dp_drho[0][jc];
                j[(irow, 1 + ip * nc + jc)] = -dp_drho[ip][jc];
            }
            irow += 1;
        }

        // Mass balance for the first Ncomp - 1 components: the in-phase mole
        // fractions, weighted by the phase fractions, reproduce the bulk.
        for ic in 0..nc - 1 {
            let mut summer = 0.0;
            for ip in 0..np {
                let rhovec = rho_views[ip];
                let rho_p = rhovec.sum();
                let x_cp = rhovec[ic] / rho_p;
                summer += betas[ip] * x_cp;
                j[(irow, ni - np + ip)] = x_cp;
                for jc in 0..nc {
                    let kron = if ic == jc { 1.0 } else { 0.0 };
                    j[(irow, 1 + ip * nc + jc)] = betas[ip] * (kron - x_cp) / rho_p;
                }
            }
            r[irow] = summer - self.zbulk[ic];
            irow += 1;
        }

        // Normalization of the phase fractions.
        r[irow] = betas.sum() - 1.0;
        for ip in 0..np {
            j[(irow, ni - np + ip)] = 1.0;
        }
        irow += 1;

        // Two specification rows, fed the phase-0 pressure quantities.
        let sidecar = Sidecar {
            n_phases: np,
            n_components: nc,
            n_independent: ni,
            p_phase0: p[0],
            dpdt_phase0: dp_dt[0],
            dpdrho_phase0: &dp_drho[0],
        };
        for spec in &self.specifications {
            let (r_spec, jrow) = spec.evaluate(x, &sidecar);
            if jrow.len() != ni {
                return Err(EquilibriumError::Invariant {
                    what: format!(
                        "specification row has length {}, expected {ni}",
                        jrow.len()
                    ),
                });
            }
            r[irow] = r_spec;
            for jc in 0..ni {
                j[(irow, jc)] = jrow[jc];
            }
            irow += 1;
        }

        if irow != ni {
            return Err(EquilibriumError::Invariant {
                what: format!("assembled {irow} rows, expected {ni}"),
            });
        }

        trace!(residual_norm = self.res.r.norm(), "assembled system");
        Ok(&self.res)
    }
}
