//! Specification equations closing the equilibrium system.
//!
//! Fugacity equality, pressure equality, mass balances, and normalization
//! leave the system two equations short of square; exactly two specification
//! equations are supplied to close it. Each contributes one residual scalar
//! and one Jacobian row, zero outside its relevant slots. New closure
//! conditions can be added by implementing [`Specification`] without touching
//! the assembler.

use crate::error::{EquilibriumError, EquilibriumResult};
use mp_core::units::{MolarVolume, Pressure, Temperature};
use nalgebra::DVector;

/// Call-scoped bundle of the phase-0 pressure and its partial derivatives,
/// computed once during assembly and shared with the specification equations
/// to avoid recomputation. Borrowed, so it cannot outlive the call.
pub struct Sidecar<'a> {
    pub n_phases: usize,
    pub n_components: usize,
    pub n_independent: usize,
    /// Phase-0 pressure [Pa]
    pub p_phase0: f64,
    /// dp/dT of phase 0 [Pa/K]
    pub dpdt_phase0: f64,
    /// dp/drho_i of phase 0 [Pa m³/mol]
    pub dpdrho_phase0: &'a DVector<f64>,
}

/// One closure condition: residual and Jacobian row at the trial point.
pub trait Specification {
    /// Check compatibility with the problem dimensions, once, before first
    /// use. Most closure conditions apply to any problem; conditions
    /// addressing one particular phase override this to reject an
    /// out-of-range index.
    fn validate(&self, _n_components: usize, _n_phases: usize) -> EquilibriumResult<()> {
        Ok(())
    }

    /// Returns `(residual, jacobian_row)`; the row has length
    /// `sidecar.n_independent` and is zero outside the relevant slots.
    fn evaluate(&self, x: &DVector<f64>, sidecar: &Sidecar<'_>) -> (f64, DVector<f64>);
}

/// Fixes the temperature: `T(x) - T_target`.
pub struct TemperatureSpec {
    t_target: f64,
}

impl TemperatureSpec {
    pub fn new(t: Temperature) -> Self {
        Self { t_target: t.value }
    }
}

impl Specification for TemperatureSpec {
    fn evaluate(&self, x: &DVector<f64>, sidecar: &Sidecar<'_>) -> (f64, DVector<f64>) {
        let mut jrow = DVector::zeros(sidecar.n_independent);
        jrow[0] = 1.0;
        (x[0] - self.t_target, jrow)
    }
}

/// Fixes the pressure of phase 0: `p_phase0 - p_target`.
///
/// Which phase is pinned is immaterial at a solution, since the pressure
/// equality rows force all phases to the same pressure.
pub struct PressureSpec {
    p_target: f64,
}

impl PressureSpec {
    pub fn new(p: Pressure) -> Self {
        Self { p_target: p.value }
    }
}

impl Specification for PressureSpec {
    fn evaluate(&self, _x: &DVector<f64>, sidecar: &Sidecar<'_>) -> (f64, DVector<f64>) {
        let mut jrow = DVector::zeros(sidecar.n_independent);
        jrow[0] = sidecar.dpdt_phase0;
        jrow.rows_mut(1, sidecar.n_components)
            .copy_from(sidecar.dpdrho_phase0);
        (sidecar.p_phase0 - self.p_target, jrow)
    }
}

/// Fixes the molar fraction of one phase: `beta_i(x) - beta_target`.
pub struct PhaseFractionSpec {
    beta_target: f64,
    phase: usize,
}

impl PhaseFractionSpec {
    pub fn new(beta: f64, phase: usize) -> Self {
        Self {
            beta_target: beta,
            phase,
        }
    }
}

impl Specification for PhaseFractionSpec {
    fn validate(&self, _n_components: usize, n_phases: usize) -> EquilibriumResult<()> {
        if self.phase >= n_phases {
            return Err(EquilibriumError::Construction {
                what: format!(
                    "phase fraction specification targets phase {}, system has {} phases",
                    self.phase, n_phases
                ),
            });
        }
        Ok(())
    }

    fn evaluate(&self, x: &DVector<f64>, sidecar: &Sidecar<'_>) -> (f64, DVector<f64>) {
        let slot = sidecar.n_independent - sidecar.n_phases + self.phase;
        let mut jrow = DVector::zeros(sidecar.n_independent);
        jrow[slot] = 1.0;
        (x[slot] - self.beta_target, jrow)
    }
}

/// Fixes the overall molar volume: `sum_p(beta_p / rho_p) - v_target`, with
/// `rho_p` the total molar density of phase `p`.
pub struct MolarVolumeSpec {
    v_target: f64,
}

impl MolarVolumeSpec {
    pub fn new(v: MolarVolume) -> Self {
        Self { v_target: v.value }
    }
}

impl Specification for MolarVolumeSpec {
    fn evaluate(&self, x: &DVector<f64>, sidecar: &Sidecar<'_>) -> (f64, DVector<f64>) {
        let nc = sidecar.n_components;
        let np = sidecar.n_phases;
        let ni = sidecar.n_independent;
        let betas = x.rows(ni - np, np);
        let mut jrow = DVector::zeros(ni);
        let mut v = 0.0;
        for ip in 0..np {
            let rho_p: f64 = x.rows(1 + ip * nc, nc).sum();
            v += betas[ip] / rho_p;
            jrow[ni - np + ip] = 1.0 / rho_p;
            for jc in 0..nc {
                jrow[1 + ip * nc + jc] = -betas[ip] / (rho_p * rho_p);
            }
        }
        (v - self.v_target, jrow)
    }
}
