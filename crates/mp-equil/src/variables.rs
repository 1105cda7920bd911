//! Packing and unpacking of the flat unknown vector.
//!
//! The layout is fixed for the lifetime of one equilibrium system:
//! `[T, rho(phase 0), rho(phase 1), ..., beta_0, ..., beta_{Nphases-1}]`
//! where each `rho(phase)` block holds the component molar densities of that
//! phase.

use crate::error::{EquilibriumError, EquilibriumResult};
use nalgebra::DVector;

/// Number of unknowns for a problem with the given dimensions.
pub fn n_independent(n_components: usize, n_phases: usize) -> usize {
    1 + (n_components + 1) * n_phases
}

/// Structured bundle of the unknowns: temperature [K], per-phase component
/// molar densities [mol/m³], and molar phase fractions.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseVariables {
    pub t: f64,
    pub rhovecs: Vec<DVector<f64>>,
    pub betas: DVector<f64>,
}

impl PhaseVariables {
    pub fn new(t: f64, rhovecs: Vec<DVector<f64>>, betas: DVector<f64>) -> Self {
        Self { t, rhovecs, betas }
    }

    /// Pack into the flat layout. Exact inverse of [`PhaseVariables::unpack`].
    pub fn pack(&self) -> DVector<f64> {
        let n: usize = 1 + self.rhovecs.iter().map(|r| r.len()).sum::<usize>() + self.betas.len();
        let mut x = DVector::zeros(n);
        x[0] = self.t;
        let mut at = 1;
        for rhovec in &self.rhovecs {
            x.rows_mut(at, rhovec.len()).copy_from(rhovec);
            at += rhovec.len();
        }
        x.rows_mut(at, self.betas.len()).copy_from(&self.betas);
        x
    }

    /// Unpack a flat vector with the given dimensions into owned pieces.
    ///
    /// The assembler itself reads the flat vector through non-owning views;
    /// this owned form is for callers preparing or inspecting trial points.
    pub fn unpack(
        x: &DVector<f64>,
        n_components: usize,
        n_phases: usize,
    ) -> EquilibriumResult<Self> {
        let expected = n_independent(n_components, n_phases);
        if x.len() != expected {
            return Err(EquilibriumError::InputSize {
                expected,
                actual: x.len(),
            });
        }
        let t = x[0];
        let rhovecs = (0..n_phases)
            .map(|ip| x.rows(1 + ip * n_components, n_components).clone_owned())
            .collect();
        let betas = x.rows(expected - n_phases, n_phases).clone_owned();
        Ok(Self { t, rhovecs, betas })
    }
}
