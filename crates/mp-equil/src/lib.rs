//! mp-equil: residual and Jacobian assembly for multiphase, multicomponent
//! thermodynamic equilibrium.
//!
//! Given a bulk composition and two specification equations, this crate
//! computes the residual vector and the analytically exact Jacobian of the
//! equilibrium system at a trial point supplied by an external Newton
//! driver: equality of component fugacities across phases, equality of
//! pressure across phases, component mass balances, normalization of the
//! molar phase fractions, and the two specification rows. The number of
//! phases and components are both arbitrary.
//!
//! This crate never iterates and never decides convergence; Newton updates,
//! line search, and restart strategies belong to the caller.

pub mod assemble;
pub mod error;
pub mod jacobian;
pub mod spec;
pub mod variables;

pub use assemble::{CallResult, PhaseEquilibrium};
pub use error::{EquilibriumError, EquilibriumResult};
pub use jacobian::central_difference_jacobian;
pub use spec::{
    MolarVolumeSpec, PhaseFractionSpec, PressureSpec, Sidecar, Specification, TemperatureSpec,
};
pub use variables::{n_independent, PhaseVariables};
