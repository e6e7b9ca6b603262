//! Oracle capability set and time-step classification.
//!
//! The verifier never depends on a concrete solver or dynamics model.
//! It talks to an [`Oracle`], the capability set any cost/dynamics
//! implementation under test must expose: state updates, scalar cost
//! queries, analytic derivative queries, and a manifold retraction.

use nalgebra::{DMatrix, DVector};
use rand::RngCore;

use crate::error::OracleError;

/// Classification of a time step within the horizon.
///
/// The terminal step `t == T - 1` has no associated control and uses a
/// state-only update path, so every verification routine dispatches on
/// this kind instead of scattering `t == T - 1` conditionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// A step in `[0, T-1)` with both state and control.
    Intermediate,
    /// The final step `T-1`, state only.
    Terminal,
}

impl StepKind {
    /// Classifies time index `t` within a horizon of `T` steps.
    #[must_use]
    pub fn at(t: usize, horizon: usize) -> Self {
        if t + 1 == horizon {
            Self::Terminal
        } else {
            Self::Intermediate
        }
    }

    /// Returns true for the terminal step.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Terminal
    }
}

/// The external dynamics/cost model under test.
///
/// Implementations hold an internal evaluation point which every
/// [`update`](Oracle::update) or
/// [`update_terminal`](Oracle::update_terminal) call fully overwrites;
/// cost and derivative queries read that point. The verifier relies on
/// there being no stale state between an update and the queries that
/// follow it.
///
/// State lives on a manifold of representation dimension
/// [`nx`](Oracle::nx) with tangent dimension [`ndx`](Oracle::ndx); the
/// two differ for non-Euclidean states (a unit-quaternion attitude has
/// `nx = 4`, `ndx = 3`). Perturbations are applied through
/// [`integrate`](Oracle::integrate), never by vector addition. Controls
/// are assumed Euclidean.
pub trait Oracle {
    /// State representation dimension.
    fn nx(&self) -> usize;

    /// Control dimension.
    fn nu(&self) -> usize;

    /// State tangent dimension.
    fn ndx(&self) -> usize;

    /// Number of time steps `T`; valid time indices are `[0, T)`.
    fn horizon(&self) -> usize;

    /// Sets the internal evaluation point for a non-terminal step `t`.
    fn update(&mut self, x: &DVector<f64>, u: &DVector<f64>, t: usize)
        -> Result<(), OracleError>;

    /// Sets the internal evaluation point for the terminal step.
    fn update_terminal(&mut self, x: &DVector<f64>) -> Result<(), OracleError>;

    /// Scalar state cost at the current evaluation point, step `t`.
    fn state_cost(&self, t: usize) -> Result<f64, OracleError>;

    /// Scalar control cost at the current evaluation point, step `t`.
    fn control_cost(&self, t: usize) -> Result<f64, OracleError>;

    /// Analytic gradient of the state cost w.r.t. the state tangent,
    /// length [`ndx`](Oracle::ndx).
    fn state_cost_jacobian(&self, t: usize) -> Result<DVector<f64>, OracleError>;

    /// Analytic second derivative of the state cost w.r.t. the state
    /// tangent, `ndx × ndx`. State-state block only.
    fn state_cost_hessian(&self, t: usize) -> Result<DMatrix<f64>, OracleError>;

    /// Analytic gradient of the control cost w.r.t. the control,
    /// length [`nu`](Oracle::nu).
    fn control_cost_jacobian(&self, t: usize) -> Result<DVector<f64>, OracleError>;

    /// Analytic second derivative of the control cost w.r.t. the
    /// control, `nu × nu`.
    fn control_cost_hessian(&self, t: usize) -> Result<DMatrix<f64>, OracleError>;

    /// Manifold retraction of `x` by `sign * dx`.
    ///
    /// `dx` has tangent dimension [`ndx`](Oracle::ndx) and `sign` is
    /// `+1.0` or `-1.0`. For Euclidean states this is `x + sign * dx`;
    /// for rotational states it must apply a proper retraction
    /// (an exponential-map-like update), since naive addition corrupts
    /// the representation.
    fn integrate(
        &self,
        x: &DVector<f64>,
        dx: &DVector<f64>,
        sign: f64,
    ) -> Result<DVector<f64>, OracleError>;

    /// Draws a random valid state on the oracle's state manifold.
    ///
    /// Samplers must produce representationally valid states (e.g. unit
    /// quaternions for attitude components) and must be deterministic
    /// for a given RNG stream, so seeded verification runs reproduce.
    fn sample_state(&self, rng: &mut dyn RngCore) -> DVector<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_kind_at_terminal() {
        assert_eq!(StepKind::at(4, 5), StepKind::Terminal);
        assert!(StepKind::at(4, 5).is_terminal());
    }

    #[test]
    fn test_step_kind_at_intermediate() {
        assert_eq!(StepKind::at(0, 5), StepKind::Intermediate);
        assert_eq!(StepKind::at(3, 5), StepKind::Intermediate);
        assert!(!StepKind::at(3, 5).is_terminal());
    }

    #[test]
    fn test_step_kind_single_step_horizon_is_terminal() {
        assert_eq!(StepKind::at(0, 1), StepKind::Terminal);
    }
}
