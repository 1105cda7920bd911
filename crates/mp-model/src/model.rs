//! Residual Helmholtz energy model trait.

use crate::error::ModelResult;
use nalgebra::{DMatrix, DVector, DVectorView};

/// Residual Helmholtz energy model evaluated at `(T, rhovec)`.
///
/// `rhovec` holds the molar density of each component in mol/m³; the residual
/// Helmholtz energy density `Psir` is in J/m³. Everything the equilibrium
/// assembly needs from an equation of state goes through these four queries,
/// so a model backed by automatic differentiation and this crate's analytic
/// van der Waals model are interchangeable behind `&dyn ResidualModel`.
pub trait ResidualModel {
    /// Molar gas constant in J/(mol K) for the given composition.
    fn gas_constant(&self, molefrac: &DVector<f64>) -> f64;

    /// `Psir` with its gradient and Hessian with respect to the component
    /// molar densities, all at `(T, rhovec)`.
    fn psir_gradient_hessian(
        &self,
        t: f64,
        rhovec: DVectorView<'_, f64>,
    ) -> ModelResult<(f64, DVector<f64>, DMatrix<f64>)>;

    /// The quantity `-T * d(alphar)/dT` at `(T, rho, molefrac)`, where
    /// `alphar = Psir / (rho R T)` is the reduced residual Helmholtz energy.
    fn ar10(&self, t: f64, rho: f64, molefrac: &DVector<f64>) -> ModelResult<f64>;

    /// Mixed second derivative `d²Psir/(dT drho_i)` for each component.
    fn d2psir_dt_drho(&self, t: f64, rhovec: DVectorView<'_, f64>) -> ModelResult<DVector<f64>>;
}
