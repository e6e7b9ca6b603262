//! Finite-difference verification of analytic trajectory-optimization
//! derivatives.
//!
//! Trajectory-optimization solvers report analytic Jacobians and
//! Hessians of their scalar state and control costs. This crate checks
//! those derivatives against central finite-difference approximations,
//! probing one perturbation dimension at a time through the model's own
//! manifold retraction, so non-Euclidean states (unit quaternions,
//! rotations) are perturbed correctly.
//!
//! # Components
//!
//! - [`Oracle`] - capability set the model under test must expose
//! - [`DerivativeVerifier`] - the four derivative checks plus a
//!   whole-horizon sweep
//! - [`VerifyParams`] - perturbation width, tolerances, RNG seed
//! - [`CheckSummary`] / [`VerifyError`] - per-check outcome and the
//!   failure taxonomy
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be
//! used in solver test suites, CI conformance runs, and offline
//! debugging of cost-function implementations.
//!
//! # Example
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use traj_verify::{DerivativeVerifier, Oracle, OracleError, VerifyParams};
//! # use rand::RngCore;
//! #
//! # struct Quad {
//! #     x: DVector<f64>,
//! # }
//! #
//! # impl Oracle for Quad {
//! #     fn nx(&self) -> usize { 1 }
//! #     fn nu(&self) -> usize { 0 }
//! #     fn ndx(&self) -> usize { 1 }
//! #     fn horizon(&self) -> usize { 1 }
//! #     fn update(
//! #         &mut self,
//! #         x: &DVector<f64>,
//! #         _u: &DVector<f64>,
//! #         _t: usize,
//! #     ) -> Result<(), OracleError> {
//! #         self.x = x.clone();
//! #         Ok(())
//! #     }
//! #     fn update_terminal(&mut self, x: &DVector<f64>) -> Result<(), OracleError> {
//! #         self.x = x.clone();
//! #         Ok(())
//! #     }
//! #     fn state_cost(&self, _t: usize) -> Result<f64, OracleError> {
//! #         Ok(0.5 * self.x[0] * self.x[0])
//! #     }
//! #     fn control_cost(&self, _t: usize) -> Result<f64, OracleError> {
//! #         Err(OracleError::new("no control"))
//! #     }
//! #     fn state_cost_jacobian(&self, _t: usize) -> Result<DVector<f64>, OracleError> {
//! #         Ok(self.x.clone())
//! #     }
//! #     fn state_cost_hessian(&self, _t: usize) -> Result<DMatrix<f64>, OracleError> {
//! #         Ok(DMatrix::identity(1, 1))
//! #     }
//! #     fn control_cost_jacobian(&self, _t: usize) -> Result<DVector<f64>, OracleError> {
//! #         Err(OracleError::new("no control"))
//! #     }
//! #     fn control_cost_hessian(&self, _t: usize) -> Result<DMatrix<f64>, OracleError> {
//! #         Err(OracleError::new("no control"))
//! #     }
//! #     fn integrate(
//! #         &self,
//! #         x: &DVector<f64>,
//! #         dx: &DVector<f64>,
//! #         sign: f64,
//! #     ) -> Result<DVector<f64>, OracleError> {
//! #         Ok(x + sign * dx)
//! #     }
//! #     fn sample_state(&self, _rng: &mut dyn RngCore) -> DVector<f64> {
//! #         DVector::from_element(1, 1.0)
//! #     }
//! # }
//! #
//! // A 1-D quadratic terminal cost c(x) = 0.5 * x^2, gradient x.
//! let mut oracle = Quad { x: DVector::zeros(1) };
//! let mut verifier = DerivativeVerifier::with_params(VerifyParams::new().with_seed(7));
//!
//! let summary = verifier.verify_state_cost_jacobian(&mut oracle, 0)?;
//! assert!(summary.max_abs_error < 1e-5);
//! # Ok::<(), traj_verify::VerifyError>(())
//! ```
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod oracle;
mod params;
mod tolerance;
mod verifier;

// Re-export oracle types
pub use oracle::{Oracle, StepKind};

// Re-export verification types
pub use params::VerifyParams;
pub use tolerance::{CheckSummary, DerivativeKind};
pub use verifier::DerivativeVerifier;

// Re-export error types
pub use error::{OracleError, Result, VerifyError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CheckSummary, DerivativeKind, DerivativeVerifier, Oracle, OracleError, StepKind,
        VerifyError, VerifyParams,
    };
}
