use ndarray::{Array1, ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Squared Euclidean distance between two points
#[inline]
pub fn distance2(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the centroid closest to `point`.
///
/// Ties go to the lowest index: a later centroid only wins on a strictly
/// smaller distance. `centroids` must have at least one row.
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> usize {
    let mut best_label = 0;
    let mut best_dist = f64::INFINITY;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = distance2(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best_label = j;
        }
    }

    best_label
}

/// Assign every data point to its nearest centroid
///
/// # Arguments
/// * `data` - Data points (n_samples, 2)
/// * `centroids` - Current centroids (k, 2)
///
/// # Returns
/// * `labels` - Cluster index for each data point (n_samples,)
pub fn assign_labels(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Array1<usize> {
    let labels: Vec<usize> = (0..data.nrows())
        .into_par_iter()
        .map(|i| nearest_centroid(&data.row(i), centroids))
        .collect();

    Array1::from_vec(labels)
}

/// Sum of squared distances from each point to its assigned centroid
pub fn compute_inertia(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
) -> f64 {
    data.outer_iter()
        .zip(labels.iter())
        .map(|(point, &label)| distance2(&point, &centroids.row(label)))
        .sum()
}

/// Compute centroid shift (sum of L2 norms of centroid movements)
pub fn compute_centroid_shift(
    old_centroids: &ArrayView2<f64>,
    new_centroids: &ArrayView2<f64>,
) -> f64 {
    old_centroids
        .outer_iter()
        .zip(new_centroids.outer_iter())
        .map(|(old_c, new_c)| distance2(&old_c, &new_c).sqrt())
        .sum()
}
