//! Parameters controlling perturbation size, tolerances and seeding.

/// Parameters for a derivative verification run.
///
/// Defaults match well-conditioned double-precision cost functions:
/// central differences with `eps = 1e-6` have truncation error around
/// `1e-12`, so an elementwise `atol = rtol = 1e-5` bound catches formula
/// errors while tolerating rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyParams {
    /// Total perturbation width; each side is displaced by `eps / 2`
    /// (default: `1e-6`).
    pub eps: f64,
    /// Relative tolerance for elementwise comparison (default: `1e-5`).
    pub rtol: f64,
    /// Absolute tolerance for elementwise comparison (default: `1e-5`).
    pub atol: f64,
    /// RNG seed for state/control sampling. `None` seeds from entropy
    /// (default: `None`).
    pub seed: Option<u64>,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            rtol: 1e-5,
            atol: 1e-5,
            seed: None,
        }
    }
}

impl VerifyParams {
    /// Creates parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the perturbation width.
    #[must_use]
    pub const fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the relative tolerance.
    #[must_use]
    pub const fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    /// Sets the absolute tolerance.
    #[must_use]
    pub const fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Sets the RNG seed, making the run reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
