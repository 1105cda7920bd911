//! mp-model: thermodynamic property models for the multiphase equilibrium core.
//!
//! Provides:
//! - `ResidualModel` trait exposing residual Helmholtz energy derivatives
//! - van der Waals mixture model with fully analytic derivatives
//!
//! # Architecture
//!
//! This crate defines a stable API (`ResidualModel` trait) that isolates the
//! equilibrium core from any particular equation of state. The trait is shaped
//! around what the residual/Jacobian assembly actually consumes: the residual
//! Helmholtz energy density and its first and second derivatives with respect
//! to temperature and the component molar densities. Backends based on
//! automatic differentiation can implement the same four queries.

pub mod error;
pub mod model;
pub mod vdw;

pub use error::{ModelError, ModelResult};
pub use model::ResidualModel;
pub use vdw::VdwMixture;
