//! Elementwise tolerance checks for derivative comparison.
//!
//! An analytic value `a` and a finite-difference estimate `n` agree when
//! `|a - n| <= atol + rtol * |n|`, the conventional elementwise allclose
//! policy. Failures report the maximal offending element so the caller
//! can locate the broken derivative component.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, VerifyError};

/// Which derivative block a verification routine is checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeKind {
    /// Gradient of the state cost w.r.t. the state tangent.
    StateJacobian,
    /// Second derivative of the state cost w.r.t. the state tangent.
    StateHessian,
    /// Gradient of the control cost w.r.t. the control.
    ControlJacobian,
    /// Second derivative of the control cost w.r.t. the control.
    ControlHessian,
}

impl fmt::Display for DerivativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StateJacobian => "state cost Jacobian",
            Self::StateHessian => "state cost Hessian",
            Self::ControlJacobian => "control cost Jacobian",
            Self::ControlHessian => "control cost Hessian",
        };
        f.write_str(name)
    }
}

/// Outcome of a single passed derivative check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSummary {
    /// Which derivative block was checked.
    pub kind: DerivativeKind,
    /// Time index that was checked.
    pub t: usize,
    /// Dimension of the probed perturbation space (`ndx` or `nu`).
    pub dim: usize,
    /// Largest elementwise absolute error between analytic and numeric.
    pub max_abs_error: f64,
}

/// Verifies the oracle reported a derivative of the declared dimension.
pub(crate) fn expect_rows(
    kind: DerivativeKind,
    t: usize,
    expected: usize,
    actual: usize,
) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(VerifyError::DimensionMismatch {
            kind,
            t,
            expected,
            actual,
        })
    }
}

/// Compares an analytic vector against its numeric estimate elementwise.
pub(crate) fn check_vectors(
    kind: DerivativeKind,
    t: usize,
    analytic: &DVector<f64>,
    numeric: &DVector<f64>,
    rtol: f64,
    atol: f64,
) -> Result<CheckSummary> {
    let mut max_abs_error = 0.0_f64;
    let mut worst: Option<(usize, f64)> = None;

    for i in 0..analytic.len() {
        let err = (analytic[i] - numeric[i]).abs();
        max_abs_error = max_abs_error.max(err);
        if err > atol + rtol * numeric[i].abs() && worst.map_or(true, |(_, w)| err > w) {
            worst = Some((i, err));
        }
    }

    match worst {
        Some((i, err)) => Err(VerifyError::ToleranceExceeded {
            kind,
            t,
            row: i,
            col: 0,
            analytic: analytic[i],
            numeric: numeric[i],
            error: err,
        }),
        None => Ok(CheckSummary {
            kind,
            t,
            dim: analytic.len(),
            max_abs_error,
        }),
    }
}

/// Compares an analytic matrix against its numeric estimate elementwise.
pub(crate) fn check_matrices(
    kind: DerivativeKind,
    t: usize,
    analytic: &DMatrix<f64>,
    numeric: &DMatrix<f64>,
    rtol: f64,
    atol: f64,
) -> Result<CheckSummary> {
    let mut max_abs_error = 0.0_f64;
    let mut worst: Option<(usize, usize, f64)> = None;

    for j in 0..analytic.ncols() {
        for i in 0..analytic.nrows() {
            let err = (analytic[(i, j)] - numeric[(i, j)]).abs();
            max_abs_error = max_abs_error.max(err);
            if err > atol + rtol * numeric[(i, j)].abs()
                && worst.map_or(true, |(_, _, w)| err > w)
            {
                worst = Some((i, j, err));
            }
        }
    }

    match worst {
        Some((i, j, err)) => Err(VerifyError::ToleranceExceeded {
            kind,
            t,
            row: i,
            col: j,
            analytic: analytic[(i, j)],
            numeric: numeric[(i, j)],
            error: err,
        }),
        None => Ok(CheckSummary {
            kind,
            t,
            dim: analytic.nrows(),
            max_abs_error,
        }),
    }
}

/// Self-consistency check: a finite-difference Hessian of a smooth cost
/// must be approximately symmetric regardless of what the oracle claims.
pub(crate) fn check_symmetry(
    kind: DerivativeKind,
    t: usize,
    numeric: &DMatrix<f64>,
    rtol: f64,
    atol: f64,
) -> Result<()> {
    let mut worst: Option<(usize, usize, f64)> = None;

    for j in 0..numeric.ncols() {
        for i in 0..j {
            let err = (numeric[(i, j)] - numeric[(j, i)]).abs();
            if err > atol + rtol * numeric[(j, i)].abs()
                && worst.map_or(true, |(_, _, w)| err > w)
            {
                worst = Some((i, j, err));
            }
        }
    }

    match worst {
        Some((i, j, err)) => Err(VerifyError::AsymmetricHessian {
            kind,
            t,
            row: i,
            col: j,
            error: err,
        }),
        None => Ok(()),
    }
}
