use crate::algorithm::{lloyd_step, run_to_convergence};
use crate::config::SessionConfig;
use crate::distance::compute_inertia;
use crate::error::KMeansError;
use crate::init::{InitMethod, InitStrategy};
use ndarray::{Array1, Array2, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// Lifecycle phase of a [`ClusterSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No active run; step and converge fail with `NotInitialized`
    Uninitialized,
    /// A run exists and has not reached a fixed point
    Initialized,
    /// The last step changed neither assignment nor centroids
    Converged,
}

/// An interactive k-means run that is advanced one call at a time.
///
/// A session owns at most one active run. `init()` replaces it atomically,
/// `step()` and `converge_all()` advance it, and `reset()` drops it.
///
/// # Example
///
/// ```
/// use kmeans_session::{ClusterSession, InitStrategy};
/// use ndarray::array;
///
/// let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
/// let manual = array![[0.0, 0.0], [10.0, 0.0]];
///
/// let mut session = ClusterSession::new();
/// session.init(&data.view(), 2, InitStrategy::Manual(manual)).unwrap();
///
/// assert!(!session.step().unwrap());
/// assert_eq!(session.centroids().unwrap(), &array![[0.0, 0.5], [10.0, 0.5]]);
/// assert!(session.step().unwrap());
/// ```
pub struct ClusterSession {
    /// Session configuration
    config: SessionConfig,

    /// Source of randomness for sampled initializations, seeded once
    rng: ChaCha8Rng,

    /// The active run (None when uninitialized)
    run: Option<ActiveRun>,
}

struct ActiveRun {
    data: Array2<f64>,
    k: usize,
    method: InitMethod,
    centroids: Array2<f64>,
    /// None after a manual init until the first step
    labels: Option<Array1<usize>>,
    iteration: usize,
    converged: bool,
}

impl Default for ClusterSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterSession {
    /// Create an uninitialized session with default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create an uninitialized session with custom configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            run: None,
        }
    }

    /// Start a new run, replacing any existing one.
    ///
    /// Sampled methods also compute the initial assignment. A manual init
    /// stores the given centroids and leaves the assignment empty until the
    /// first step.
    ///
    /// # Errors
    ///
    /// All validation happens before the session is touched, so on error the
    /// previous run (if any) is left exactly as it was.
    /// - `InvalidK` if `k == 0`, or `k > n_samples` for sampled methods
    /// - `ManualCountMismatch` if manual centroids don't number `k`
    /// - `InvalidDimensions` / `NonFiniteCoordinate` for malformed points
    pub fn init(
        &mut self,
        data: &ArrayView2<f64>,
        k: usize,
        strategy: InitStrategy,
    ) -> Result<(), KMeansError> {
        let init = strategy.initialize(data, k, &mut self.rng)?;

        info!(
            method = %strategy.method(),
            k,
            n_samples = data.nrows(),
            "initialized clustering session"
        );

        self.run = Some(ActiveRun {
            data: data.to_owned(),
            k,
            method: strategy.method(),
            centroids: init.centroids,
            labels: init.labels,
            iteration: 0,
            converged: false,
        });

        Ok(())
    }

    /// Apply one Lloyd iteration.
    ///
    /// Returns whether the session has converged. Once converged, further
    /// steps change nothing and keep returning `true`.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if there is no active run.
    pub fn step(&mut self) -> Result<bool, KMeansError> {
        let run = self.run.as_mut().ok_or(KMeansError::NotInitialized)?;

        if run.converged {
            return Ok(true);
        }

        let outcome = lloyd_step(&run.data.view(), &run.centroids.view(), run.labels.as_ref());

        run.centroids = outcome.centroids;
        run.labels = Some(outcome.labels);
        run.iteration += 1;
        run.converged = outcome.converged;

        Ok(run.converged)
    }

    /// Step until convergence or until `config.max_iters` steps have run in
    /// this call.
    ///
    /// Returns whether true convergence was reached. Stopping at the cap
    /// still leaves a valid run, which later calls can continue.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if there is no active run.
    pub fn converge_all(&mut self) -> Result<bool, KMeansError> {
        let max_iters = self.config.max_iters;
        let run = self.run.as_mut().ok_or(KMeansError::NotInitialized)?;

        if run.converged {
            return Ok(true);
        }

        let outcome = run_to_convergence(
            &run.data.view(),
            run.centroids.clone(),
            run.labels.take(),
            max_iters,
        );

        run.centroids = outcome.centroids;
        run.labels = outcome.labels;
        run.iteration += outcome.n_iterations;
        run.converged = outcome.converged;

        if run.converged {
            info!(
                iterations = run.iteration,
                steps = outcome.n_iterations,
                "clustering converged"
            );
        } else {
            warn!(
                max_iters,
                iterations = run.iteration,
                "iteration cap reached before convergence"
            );
        }

        Ok(run.converged)
    }

    /// Drop the active run. Always succeeds.
    pub fn reset(&mut self) {
        if self.run.take().is_some() {
            info!("clustering session reset");
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        match &self.run {
            None => SessionPhase::Uninitialized,
            Some(run) if run.converged => SessionPhase::Converged,
            Some(_) => SessionPhase::Initialized,
        }
    }

    /// Whether a run is active.
    pub fn is_initialized(&self) -> bool {
        self.run.is_some()
    }

    /// Whether the active run has converged. False when uninitialized.
    pub fn has_converged(&self) -> bool {
        self.run.as_ref().map_or(false, |run| run.converged)
    }

    /// Current centroids, shape (k, 2).
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.run.as_ref().map(|run| &run.centroids)
    }

    /// Current assignment, one cluster index per point.
    ///
    /// `None` when uninitialized, and after a manual init until the first step.
    pub fn assignments(&self) -> Option<&Array1<usize>> {
        self.run.as_ref().and_then(|run| run.labels.as_ref())
    }

    /// The dataset of the active run.
    pub fn data(&self) -> Option<&Array2<f64>> {
        self.run.as_ref().map(|run| &run.data)
    }

    /// Number of clusters of the active run.
    pub fn k(&self) -> Option<usize> {
        self.run.as_ref().map(|run| run.k)
    }

    /// Initialization method of the active run.
    pub fn method(&self) -> Option<InitMethod> {
        self.run.as_ref().map(|run| run.method)
    }

    /// Lloyd steps applied since the last init. No-op steps are not counted.
    pub fn iteration(&self) -> usize {
        self.run.as_ref().map_or(0, |run| run.iteration)
    }

    /// Sum of squared distances from each point to its assigned centroid.
    pub fn inertia(&self) -> Option<f64> {
        let run = self.run.as_ref()?;
        let labels = run.labels.as_ref()?;
        Some(compute_inertia(
            &run.data.view(),
            &run.centroids.view(),
            &labels.view(),
        ))
    }

    /// Number of points assigned to each cluster index.
    pub fn cluster_sizes(&self) -> Option<Vec<usize>> {
        let run = self.run.as_ref()?;
        let labels = run.labels.as_ref()?;
        let mut sizes = vec![0usize; run.k];
        for &label in labels.iter() {
            sizes[label] += 1;
        }
        Some(sizes)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
