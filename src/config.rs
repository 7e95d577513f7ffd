/// Configuration for a clustering session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of Lloyd iterations a single `converge_all()` call may run.
    /// Reaching the cap leaves the session valid but not converged.
    pub max_iters: usize,

    /// Random seed for the random, farthest-first and k-means++ initializations.
    /// The RNG is seeded once per session, so successive inits keep drawing
    /// from the same stream.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iters: 300,
            seed: 0,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call iteration cap for `converge_all()`
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
