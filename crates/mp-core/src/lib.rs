//! mp-core: shared foundation for the multiphase equilibrium workspace.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + physical constants)

pub mod numeric;
pub mod units;

pub use numeric::*;
pub use units::*;
