//! Error types for the traj-verify crate.

use thiserror::Error;

use crate::tolerance::DerivativeKind;

/// Error raised by an [`Oracle`](crate::Oracle) implementation.
///
/// The verifier treats the oracle as a black box: oracle failures are
/// propagated to the caller unmodified and never retried.
#[derive(Debug, Clone, Error)]
#[error("oracle call failed: {message}")]
pub struct OracleError {
    message: String,
}

impl OracleError {
    /// Creates a new oracle error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The underlying failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that can occur during derivative verification.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// An analytic derivative disagrees with its finite-difference
    /// approximation beyond `atol + rtol * |numeric|`.
    #[error(
        "{kind} does not match at t={t}: element ({row},{col}) analytic {analytic:.9e} \
         vs numeric {numeric:.9e} (abs error {error:.3e})"
    )]
    ToleranceExceeded {
        /// Which derivative block failed.
        kind: DerivativeKind,
        /// Time index under test.
        t: usize,
        /// Row of the worst offending element (element index for vectors).
        row: usize,
        /// Column of the worst offending element (0 for vectors).
        col: usize,
        /// Analytic value reported by the oracle.
        analytic: f64,
        /// Central-difference estimate.
        numeric: f64,
        /// Absolute error between the two.
        error: f64,
    },

    /// The finite-difference Hessian failed the built-in symmetry
    /// self-consistency check, before any comparison with the oracle.
    #[error(
        "{kind} numeric estimate is not symmetric at t={t}: element ({row},{col}) \
         differs from its transpose by {error:.3e}"
    )]
    AsymmetricHessian {
        /// Which Hessian block failed.
        kind: DerivativeKind,
        /// Time index under test.
        t: usize,
        /// Row of the worst offending element.
        row: usize,
        /// Column of the worst offending element.
        col: usize,
        /// Absolute difference from the transposed element.
        error: f64,
    },

    /// The oracle reported a derivative whose shape disagrees with its
    /// declared dimensions. Fatal precondition, not a tolerance failure.
    #[error("{kind} at t={t}: expected dimension {expected}, oracle returned {actual}")]
    DimensionMismatch {
        /// Which derivative block was queried.
        kind: DerivativeKind,
        /// Time index under test.
        t: usize,
        /// Expected dimension (`ndx` or `nu`).
        expected: usize,
        /// Dimension actually reported by the oracle.
        actual: usize,
    },

    /// Time index outside `[0, T)`.
    #[error("time index {t} out of range for horizon {horizon}")]
    TimeIndexOutOfRange {
        /// The requested time index.
        t: usize,
        /// The oracle's horizon `T`.
        horizon: usize,
    },

    /// Control derivatives requested at the terminal step, which has no
    /// associated control.
    #[error("no control exists at terminal step t={t}")]
    TerminalControl {
        /// The terminal time index.
        t: usize,
    },

    /// An oracle call itself failed. Propagated unmodified.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_exceeded_names_the_kind() {
        let err = VerifyError::ToleranceExceeded {
            kind: DerivativeKind::StateJacobian,
            t: 3,
            row: 1,
            col: 0,
            analytic: 1.0,
            numeric: 2.0,
            error: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("state cost Jacobian"));
        assert!(msg.contains("t=3"));
        assert!(msg.contains("(1,0)"));
    }

    #[test]
    fn test_oracle_error_passes_through() {
        let err: VerifyError = OracleError::new("invalid state").into();
        assert!(err.to_string().contains("invalid state"));
    }
}
