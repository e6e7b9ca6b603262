//! Central finite-difference verification of analytic cost derivatives.
//!
//! Each check probes one perturbation dimension at a time with a
//! symmetric `±eps/2` displacement, so the difference quotient has
//! second-order truncation error at the price of two oracle evaluations
//! per dimension. State perturbations go through the oracle's
//! [`integrate`](crate::Oracle::integrate) retraction because the state
//! manifold may be non-Euclidean; control perturbations use plain
//! vector arithmetic.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, VerifyError};
use crate::oracle::{Oracle, StepKind};
use crate::params::VerifyParams;
use crate::tolerance::{
    check_matrices, check_symmetry, check_vectors, expect_rows, CheckSummary, DerivativeKind,
};

/// Verifies analytic derivatives reported by an [`Oracle`] against
/// central finite-difference approximations.
///
/// Every check draws a fresh random evaluation point, so repeated calls
/// probe different regions of the cost landscape; seed the verifier via
/// [`VerifyParams::with_seed`] to make a run reproducible. Checks
/// overwrite the oracle's internal evaluation point repeatedly, so the
/// oracle's state after a check is unspecified.
#[derive(Debug)]
pub struct DerivativeVerifier {
    params: VerifyParams,
    rng: StdRng,
}

impl Default for DerivativeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivativeVerifier {
    /// Creates a verifier with default parameters and an entropy seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(VerifyParams::default())
    }

    /// Creates a verifier with explicit parameters.
    #[must_use]
    pub fn with_params(params: VerifyParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { params, rng }
    }

    /// The parameters this verifier runs with.
    #[must_use]
    pub fn params(&self) -> &VerifyParams {
        &self.params
    }

    /// Verifies the analytic state cost Jacobian at time index `t`.
    ///
    /// Draws a random state and control, applies the step update, then
    /// for each tangent dimension retracts the state by `±eps/2` along
    /// a one-hot perturbation and differences the scalar state cost.
    ///
    /// # Errors
    ///
    /// [`VerifyError::ToleranceExceeded`] on disagreement,
    /// [`VerifyError::DimensionMismatch`] if the oracle's Jacobian is
    /// not of length `ndx`, [`VerifyError::TimeIndexOutOfRange`] for
    /// `t >= T`, and [`VerifyError::Oracle`] for propagated oracle
    /// failures.
    pub fn verify_state_cost_jacobian<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        t: usize,
    ) -> Result<CheckSummary> {
        let kind = step_kind_checked(oracle, t)?;
        let ndx = oracle.ndx();
        let x = oracle.sample_state(&mut self.rng);
        let u = self.random_control(oracle.nu());

        apply_update(oracle, kind, &x, &u, t)?;
        let analytic = oracle.state_cost_jacobian(t)?;
        expect_rows(DerivativeKind::StateJacobian, t, ndx, analytic.len())?;

        let eps = self.params.eps;
        let mut numeric = DVector::zeros(ndx);
        for i in 0..ndx {
            let dx = one_hot(ndx, i, eps / 2.0);
            let x_plus = oracle.integrate(&x, &dx, 1.0)?;
            let x_minus = oracle.integrate(&x, &dx, -1.0)?;

            apply_update(oracle, kind, &x_plus, &u, t)?;
            let cost_plus = oracle.state_cost(t)?;

            apply_update(oracle, kind, &x_minus, &u, t)?;
            let cost_minus = oracle.state_cost(t)?;

            numeric[i] = (cost_plus - cost_minus) / eps;
        }

        check_vectors(
            DerivativeKind::StateJacobian,
            t,
            &analytic,
            &numeric,
            self.params.rtol,
            self.params.atol,
        )
    }

    /// Verifies the analytic state cost Hessian at time index `t`.
    ///
    /// Same perturbation loop as the Jacobian check, but differences
    /// the analytic state cost *Jacobian* at each displaced state to
    /// assemble the numeric Hessian column by column. The numeric
    /// estimate must pass a symmetry self-check before it is compared
    /// with the oracle's Hessian. Only the state-state block is
    /// covered; mixed state/control second derivatives are out of
    /// scope.
    ///
    /// # Errors
    ///
    /// As [`verify_state_cost_jacobian`](Self::verify_state_cost_jacobian),
    /// plus [`VerifyError::AsymmetricHessian`] if the finite-difference
    /// estimate itself is inconsistent.
    pub fn verify_state_cost_hessian<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        t: usize,
    ) -> Result<CheckSummary> {
        let kind = step_kind_checked(oracle, t)?;
        let ndx = oracle.ndx();
        let x = oracle.sample_state(&mut self.rng);
        let u = self.random_control(oracle.nu());

        apply_update(oracle, kind, &x, &u, t)?;
        let analytic = oracle.state_cost_hessian(t)?;
        expect_rows(DerivativeKind::StateHessian, t, ndx, analytic.nrows())?;
        expect_rows(DerivativeKind::StateHessian, t, ndx, analytic.ncols())?;

        let eps = self.params.eps;
        let mut numeric = DMatrix::zeros(ndx, ndx);
        for i in 0..ndx {
            let dx = one_hot(ndx, i, eps / 2.0);
            let x_plus = oracle.integrate(&x, &dx, 1.0)?;
            let x_minus = oracle.integrate(&x, &dx, -1.0)?;

            apply_update(oracle, kind, &x_plus, &u, t)?;
            let jac_plus = oracle.state_cost_jacobian(t)?;
            expect_rows(DerivativeKind::StateHessian, t, ndx, jac_plus.len())?;

            apply_update(oracle, kind, &x_minus, &u, t)?;
            let jac_minus = oracle.state_cost_jacobian(t)?;
            expect_rows(DerivativeKind::StateHessian, t, ndx, jac_minus.len())?;

            numeric.set_column(i, &((jac_plus - jac_minus) / eps));
        }

        check_symmetry(
            DerivativeKind::StateHessian,
            t,
            &numeric,
            self.params.rtol,
            self.params.atol,
        )?;
        check_matrices(
            DerivativeKind::StateHessian,
            t,
            &analytic,
            &numeric,
            self.params.rtol,
            self.params.atol,
        )
    }

    /// Verifies the analytic control cost Jacobian at time index `t`.
    ///
    /// Defined only for `t` in `[0, T-1)`; the terminal step has no
    /// control. The control is perturbed by plain vector arithmetic
    /// while the state is held fixed.
    ///
    /// # Errors
    ///
    /// [`VerifyError::TerminalControl`] at `t == T-1`, otherwise as
    /// [`verify_state_cost_jacobian`](Self::verify_state_cost_jacobian).
    pub fn verify_control_cost_jacobian<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        t: usize,
    ) -> Result<CheckSummary> {
        refuse_terminal_control(oracle, t)?;
        let nu = oracle.nu();
        let x = oracle.sample_state(&mut self.rng);
        let u = self.random_control(nu);

        oracle.update(&x, &u, t)?;
        let analytic = oracle.control_cost_jacobian(t)?;
        expect_rows(DerivativeKind::ControlJacobian, t, nu, analytic.len())?;

        let eps = self.params.eps;
        let mut numeric = DVector::zeros(nu);
        for i in 0..nu {
            let mut u_plus = u.clone();
            u_plus[i] += eps / 2.0;
            let mut u_minus = u.clone();
            u_minus[i] -= eps / 2.0;

            oracle.update(&x, &u_plus, t)?;
            let cost_plus = oracle.control_cost(t)?;

            oracle.update(&x, &u_minus, t)?;
            let cost_minus = oracle.control_cost(t)?;

            numeric[i] = (cost_plus - cost_minus) / eps;
        }

        check_vectors(
            DerivativeKind::ControlJacobian,
            t,
            &analytic,
            &numeric,
            self.params.rtol,
            self.params.atol,
        )
    }

    /// Verifies the analytic control cost Hessian at time index `t`.
    ///
    /// Control analogue of
    /// [`verify_state_cost_hessian`](Self::verify_state_cost_hessian):
    /// differences the analytic control cost Jacobian at `u ± eps/2`
    /// per control dimension, with the same symmetry self-check.
    ///
    /// # Errors
    ///
    /// As [`verify_control_cost_jacobian`](Self::verify_control_cost_jacobian),
    /// plus [`VerifyError::AsymmetricHessian`].
    pub fn verify_control_cost_hessian<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        t: usize,
    ) -> Result<CheckSummary> {
        refuse_terminal_control(oracle, t)?;
        let nu = oracle.nu();
        let x = oracle.sample_state(&mut self.rng);
        let u = self.random_control(nu);

        oracle.update(&x, &u, t)?;
        let analytic = oracle.control_cost_hessian(t)?;
        expect_rows(DerivativeKind::ControlHessian, t, nu, analytic.nrows())?;
        expect_rows(DerivativeKind::ControlHessian, t, nu, analytic.ncols())?;

        let eps = self.params.eps;
        let mut numeric = DMatrix::zeros(nu, nu);
        for i in 0..nu {
            let mut u_plus = u.clone();
            u_plus[i] += eps / 2.0;
            let mut u_minus = u.clone();
            u_minus[i] -= eps / 2.0;

            oracle.update(&x, &u_plus, t)?;
            let jac_plus = oracle.control_cost_jacobian(t)?;
            expect_rows(DerivativeKind::ControlHessian, t, nu, jac_plus.len())?;

            oracle.update(&x, &u_minus, t)?;
            let jac_minus = oracle.control_cost_jacobian(t)?;
            expect_rows(DerivativeKind::ControlHessian, t, nu, jac_minus.len())?;

            numeric.set_column(i, &((jac_plus - jac_minus) / eps));
        }

        check_symmetry(
            DerivativeKind::ControlHessian,
            t,
            &numeric,
            self.params.rtol,
            self.params.atol,
        )?;
        check_matrices(
            DerivativeKind::ControlHessian,
            t,
            &analytic,
            &numeric,
            self.params.rtol,
            self.params.atol,
        )
    }

    /// Runs every applicable check at every time index.
    ///
    /// State checks sweep `t` in `[0, T)`; control checks sweep `t` in
    /// `[0, T-1)`. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// The first failure any individual check reports.
    pub fn verify_problem<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
    ) -> Result<Vec<CheckSummary>> {
        let horizon = oracle.horizon();
        let mut summaries = Vec::with_capacity(4 * horizon);

        for t in 0..horizon {
            summaries.push(self.verify_state_cost_jacobian(oracle, t)?);
        }
        for t in 0..horizon {
            summaries.push(self.verify_state_cost_hessian(oracle, t)?);
        }
        for t in 0..horizon.saturating_sub(1) {
            summaries.push(self.verify_control_cost_jacobian(oracle, t)?);
        }
        for t in 0..horizon.saturating_sub(1) {
            summaries.push(self.verify_control_cost_hessian(oracle, t)?);
        }

        Ok(summaries)
    }

    /// Controls are Euclidean, sampled uniformly from `[0, 1)`.
    fn random_control(&mut self, nu: usize) -> DVector<f64> {
        DVector::from_fn(nu, |_, _| self.rng.gen::<f64>())
    }
}

fn step_kind_checked<O: Oracle + ?Sized>(oracle: &O, t: usize) -> Result<StepKind> {
    let horizon = oracle.horizon();
    if t >= horizon {
        return Err(VerifyError::TimeIndexOutOfRange { t, horizon });
    }
    Ok(StepKind::at(t, horizon))
}

fn refuse_terminal_control<O: Oracle + ?Sized>(oracle: &O, t: usize) -> Result<()> {
    match step_kind_checked(oracle, t)? {
        StepKind::Intermediate => Ok(()),
        StepKind::Terminal => Err(VerifyError::TerminalControl { t }),
    }
}

/// Dispatches an update through the step kind: terminal steps take the
/// state-only path, everything else carries state, control and index.
fn apply_update<O: Oracle + ?Sized>(
    oracle: &mut O,
    kind: StepKind,
    x: &DVector<f64>,
    u: &DVector<f64>,
    t: usize,
) -> Result<()> {
    match kind {
        StepKind::Terminal => oracle.update_terminal(x)?,
        StepKind::Intermediate => oracle.update(x, u, t)?,
    }
    Ok(())
}

fn one_hot(dim: usize, index: usize, value: f64) -> DVector<f64> {
    let mut v = DVector::zeros(dim);
    v[index] = value;
    v
}
