//! Derivative verification over a non-Euclidean (unit quaternion) state.
//!
//! State is a unit quaternion stored as `[w, i, j, k]` with `nx = 4`
//! and a 3-dimensional tangent (`ndx = 3`). The state cost is
//! `c(q) = 1 - w`, whose gradient with respect to a right tangent
//! perturbation `q * exp(dx)` is exactly half the quaternion vector
//! part. The proper retraction passes the Jacobian check; a naive
//! vector-addition stand-in leaves `w` untouched, producing a zero
//! finite-difference gradient, and must fail.

use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};
use rand::{Rng, RngCore};
use traj_verify::{
    DerivativeKind, DerivativeVerifier, Oracle, OracleError, VerifyError, VerifyParams,
};

const T: usize = 2;

struct AttitudeOracle {
    x: DVector<f64>,
    u: DVector<f64>,
    /// Replace the retraction with unnormalized vector-part addition.
    naive_integrate: bool,
}

impl AttitudeOracle {
    fn new() -> Self {
        Self {
            x: DVector::from_vec(vec![1.0, 0.0, 0.0, 0.0]),
            u: DVector::zeros(1),
            naive_integrate: false,
        }
    }

    fn with_naive_integrate() -> Self {
        Self {
            naive_integrate: true,
            ..Self::new()
        }
    }
}

fn to_quat(x: &DVector<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(x[0], x[1], x[2], x[3]))
}

fn to_state(q: &UnitQuaternion<f64>) -> DVector<f64> {
    DVector::from_vec(vec![q.w, q.i, q.j, q.k])
}

impl Oracle for AttitudeOracle {
    fn nx(&self) -> usize {
        4
    }

    fn nu(&self) -> usize {
        1
    }

    fn ndx(&self) -> usize {
        3
    }

    fn horizon(&self) -> usize {
        T
    }

    fn update(&mut self, x: &DVector<f64>, u: &DVector<f64>, t: usize) -> Result<(), OracleError> {
        if t + 1 >= T {
            return Err(OracleError::new(format!("no intermediate step at t={t}")));
        }
        self.x = x.clone();
        self.u = u.clone();
        Ok(())
    }

    fn update_terminal(&mut self, x: &DVector<f64>) -> Result<(), OracleError> {
        self.x = x.clone();
        Ok(())
    }

    fn state_cost(&self, _t: usize) -> Result<f64, OracleError> {
        Ok(1.0 - self.x[0])
    }

    fn control_cost(&self, _t: usize) -> Result<f64, OracleError> {
        Ok(self.u[0] * self.u[0])
    }

    fn state_cost_jacobian(&self, _t: usize) -> Result<DVector<f64>, OracleError> {
        // d(1 - w)/d(dx) at dx = 0 for q * exp(dx) is v / 2.
        Ok(DVector::from_vec(vec![
            0.5 * self.x[1],
            0.5 * self.x[2],
            0.5 * self.x[3],
        ]))
    }

    fn state_cost_hessian(&self, _t: usize) -> Result<DMatrix<f64>, OracleError> {
        Err(OracleError::new(
            "state cost hessian not implemented for the attitude cost",
        ))
    }

    fn control_cost_jacobian(&self, _t: usize) -> Result<DVector<f64>, OracleError> {
        Ok(2.0 * self.u.clone())
    }

    fn control_cost_hessian(&self, _t: usize) -> Result<DMatrix<f64>, OracleError> {
        Ok(DMatrix::from_element(1, 1, 2.0))
    }

    fn integrate(
        &self,
        x: &DVector<f64>,
        dx: &DVector<f64>,
        sign: f64,
    ) -> Result<DVector<f64>, OracleError> {
        if self.naive_integrate {
            // Deliberately wrong: treats the quaternion vector part as a
            // Euclidean subspace and skips renormalization.
            let mut out = x.clone();
            for k in 0..3 {
                out[1 + k] += sign * dx[k];
            }
            return Ok(out);
        }
        let q = to_quat(x);
        let step = UnitQuaternion::from_scaled_axis(sign * Vector3::new(dx[0], dx[1], dx[2]));
        Ok(to_state(&(q * step)))
    }

    fn sample_state(&self, rng: &mut dyn RngCore) -> DVector<f64> {
        // Rotation angle bounded away from zero so the quaternion vector
        // part stays well above the verification tolerance.
        let axis = loop {
            let candidate = Vector3::new(
                rng.gen::<f64>() * 2.0 - 1.0,
                rng.gen::<f64>() * 2.0 - 1.0,
                rng.gen::<f64>() * 2.0 - 1.0,
            );
            if candidate.norm() > 0.1 {
                break candidate.normalize();
            }
        };
        let angle = 0.4 + 1.6 * rng.gen::<f64>();
        to_state(&UnitQuaternion::from_scaled_axis(axis * angle))
    }
}

fn seeded_verifier(seed: u64) -> DerivativeVerifier {
    DerivativeVerifier::with_params(VerifyParams::new().with_seed(seed))
}

#[test]
fn state_jacobian_matches_with_proper_retraction() {
    let mut oracle = AttitudeOracle::new();
    let mut verifier = seeded_verifier(11);
    for t in 0..T {
        let summary = verifier.verify_state_cost_jacobian(&mut oracle, t).unwrap();
        assert_eq!(summary.kind, DerivativeKind::StateJacobian);
        assert_eq!(summary.dim, 3);
        assert!(summary.max_abs_error < 1e-5);
    }
}

#[test]
fn naive_vector_addition_fails_the_jacobian_check() {
    let mut oracle = AttitudeOracle::with_naive_integrate();
    let mut verifier = seeded_verifier(12);
    let err = verifier.verify_state_cost_jacobian(&mut oracle, 0).unwrap_err();
    assert!(matches!(
        err,
        VerifyError::ToleranceExceeded {
            kind: DerivativeKind::StateJacobian,
            ..
        }
    ));
}

#[test]
fn control_derivatives_match_despite_manifold_state() {
    let mut oracle = AttitudeOracle::new();
    let mut verifier = seeded_verifier(13);
    verifier.verify_control_cost_jacobian(&mut oracle, 0).unwrap();
    verifier.verify_control_cost_hessian(&mut oracle, 0).unwrap();
}

#[test]
fn oracle_failure_propagates_unmodified() {
    let mut oracle = AttitudeOracle::new();
    let mut verifier = seeded_verifier(14);
    let err = verifier.verify_state_cost_hessian(&mut oracle, 0).unwrap_err();
    match err {
        VerifyError::Oracle(inner) => {
            assert!(inner.message().contains("not implemented"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// The retraction itself must preserve unit norm under perturbation.
#[test]
fn retraction_preserves_unit_norm() {
    let oracle = AttitudeOracle::new();
    let x = to_state(&UnitQuaternion::from_scaled_axis(Vector3::new(0.3, -0.2, 0.9)));
    let dx = DVector::from_vec(vec![5e-7, 0.0, 0.0]);

    let x_plus = oracle.integrate(&x, &dx, 1.0).unwrap();
    let norm = (0..4).map(|i| x_plus[i] * x_plus[i]).sum::<f64>().sqrt();
    approx::assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
}
