//! Configuration for chain construction and simulation.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::MarkovError;

/// Configuration shared by [`MarkovChain`](crate::MarkovChain) and
/// [`HigherOrderChain`](crate::HigherOrderChain).
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use chainsim_markov::ChainConfig;
///
/// let config = ChainConfig::new()
///     .with_seed(42)
///     .with_tolerance(1e-6);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct ChainConfig {
    seed: Option<u64>,
    strict: bool,
    tolerance: f64,
    require_coverage: bool,
}

impl ChainConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: no seed (OS entropy), `strict = true`, `tolerance = 1e-9`,
    /// `require_coverage = false`.
    pub fn new() -> Self {
        Self {
            seed: None,
            strict: true,
            tolerance: 1e-9,
            require_coverage: false,
        }
    }

    /// Seeds the chain's random source for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets or clears the seed.
    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables the row-sum check at construction.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the row-sum tolerance used in strict mode.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Requires a higher-order matrix to have a row for every possible history.
    pub fn with_require_coverage(mut self, require: bool) -> Self {
        self.require_coverage = require;
        self
    }

    /// Returns the seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns whether row sums are checked.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Returns the row-sum tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns whether full history coverage is required.
    pub fn require_coverage(&self) -> bool {
        self.require_coverage
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidArgument`] if the tolerance is not finite
    /// or is negative.
    pub fn validate(&self) -> Result<(), MarkovError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(MarkovError::InvalidArgument {
                reason: format!(
                    "tolerance must be finite and >= 0, got {}",
                    self.tolerance
                ),
            });
        }
        Ok(())
    }

    /// Builds the random source for one chain.
    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new()
    }
}
