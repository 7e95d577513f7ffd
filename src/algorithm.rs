use crate::distance::{assign_labels, compute_centroid_shift};
use ndarray::{Array1, Array2, ArrayView2};
use tracing::debug;

/// Result of a single Lloyd iteration
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub centroids: Array2<f64>,
    pub labels: Array1<usize>,
    /// Neither the assignment nor any centroid changed
    pub converged: bool,
}

/// Result of running Lloyd iterations up to a cap
#[derive(Debug, Clone)]
pub struct ConvergeOutcome {
    pub centroids: Array2<f64>,
    /// `None` only if no iteration ran and there was no assignment to begin with
    pub labels: Option<Array1<usize>>,
    pub converged: bool,
    pub n_iterations: usize,
}

/// Run one Lloyd iteration: assign every point, then move each centroid to
/// the mean of its points.
///
/// `prev_labels` is `None` when no assignment exists yet (manual init), in
/// which case the step never reports convergence.
pub fn lloyd_step(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    prev_labels: Option<&Array1<usize>>,
) -> StepOutcome {
    let labels = assign_labels(data, centroids);
    let new_centroids = update_centroids(data, &labels, centroids);

    let labels_unchanged = prev_labels.map_or(false, |prev| *prev == labels);
    // Centroids are a pure function of the assignment, so with unchanged labels
    // this only differs on the first step after init
    let centroids_unchanged = new_centroids.view() == *centroids;
    let converged = labels_unchanged && centroids_unchanged;

    debug!(
        reassigned = prev_labels.map_or(labels.len(), |prev| count_changed(prev, &labels)),
        shift = compute_centroid_shift(centroids, &new_centroids.view()),
        converged,
        "lloyd step"
    );

    StepOutcome {
        centroids: new_centroids,
        labels,
        converged,
    }
}

/// Mean of the points assigned to each cluster.
///
/// A cluster with no points keeps its previous position. Each coordinate is
/// divided by its cluster size before it is added, so the mean stays finite
/// whenever the points are. Sums run serially in dataset order so repeated
/// updates from the same assignment are bit-identical.
pub fn update_centroids(
    data: &ArrayView2<f64>,
    labels: &Array1<usize>,
    prev_centroids: &ArrayView2<f64>,
) -> Array2<f64> {
    let k = prev_centroids.nrows();
    let n_features = data.ncols();

    let mut cluster_counts = vec![0usize; k];
    for &label in labels.iter() {
        cluster_counts[label] += 1;
    }

    let mut cluster_means: Array2<f64> = Array2::zeros((k, n_features));
    for (point, &label) in data.outer_iter().zip(labels.iter()) {
        let count = cluster_counts[label] as f64;
        for j in 0..n_features {
            cluster_means[[label, j]] += point[j] / count;
        }
    }

    let mut centroids = prev_centroids.to_owned();
    for (cluster_idx, &count) in cluster_counts.iter().enumerate() {
        if count > 0 {
            centroids.row_mut(cluster_idx).assign(&cluster_means.row(cluster_idx));
        }
    }

    centroids
}

/// Apply Lloyd iterations until convergence or until `max_iters` have run.
///
/// Hitting the cap is not an error: the last state is returned with
/// `converged = false`.
pub fn run_to_convergence(
    data: &ArrayView2<f64>,
    centroids: Array2<f64>,
    labels: Option<Array1<usize>>,
    max_iters: usize,
) -> ConvergeOutcome {
    let mut centroids = centroids;
    let mut labels = labels;
    let mut converged = false;
    let mut n_iterations = 0;

    while n_iterations < max_iters {
        let outcome = lloyd_step(data, &centroids.view(), labels.as_ref());
        n_iterations += 1;

        centroids = outcome.centroids;
        labels = Some(outcome.labels);

        if outcome.converged {
            converged = true;
            break;
        }
    }

    ConvergeOutcome {
        centroids,
        labels,
        converged,
        n_iterations,
    }
}

fn count_changed(prev: &Array1<usize>, next: &Array1<usize>) -> usize {
    prev.iter().zip(next.iter()).filter(|(a, b)| a != b).count()
}
