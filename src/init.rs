use crate::distance::{assign_labels, distance2};
use crate::error::KMeansError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How the initial centroids of a session are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitMethod {
    /// k distinct data points, sampled uniformly without replacement
    #[serde(rename = "random")]
    Random,
    /// Greedy farthest-point traversal from a random first point
    #[serde(rename = "farthest_first")]
    FarthestFirst,
    /// D²-weighted sampling from a random first point
    #[serde(rename = "kmeans++")]
    KMeansPlusPlus,
    /// Centroids supplied by the caller
    #[serde(rename = "manual")]
    Manual,
}

impl InitMethod {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            InitMethod::Random => "random",
            InitMethod::FarthestFirst => "farthest_first",
            InitMethod::KMeansPlusPlus => "kmeans++",
            InitMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(InitMethod::Random),
            "farthest_first" => Ok(InitMethod::FarthestFirst),
            "kmeans++" => Ok(InitMethod::KMeansPlusPlus),
            "manual" => Ok(InitMethod::Manual),
            other => Err(format!("Unknown initialization method: {}", other)),
        }
    }
}

/// An initialization method together with the inputs it needs.
///
/// Only `Manual` carries data: the centroids the caller picked, shape (k, 2).
#[derive(Debug, Clone, PartialEq)]
pub enum InitStrategy {
    Random,
    FarthestFirst,
    KMeansPlusPlus,
    Manual(Array2<f64>),
}

/// Initial centroids, plus the initial assignment for sampled methods
#[derive(Debug, Clone)]
pub struct Initialization {
    pub centroids: Array2<f64>,
    pub labels: Option<Array1<usize>>,
}

impl InitStrategy {
    /// Build a strategy from a method name and optional manual centroids.
    ///
    /// `Manual` without centroids becomes an empty centroid set, which then
    /// fails the count check in `initialize()`.
    pub fn from_method(method: InitMethod, manual_centroids: Option<Array2<f64>>) -> Self {
        match method {
            InitMethod::Random => InitStrategy::Random,
            InitMethod::FarthestFirst => InitStrategy::FarthestFirst,
            InitMethod::KMeansPlusPlus => InitStrategy::KMeansPlusPlus,
            InitMethod::Manual => {
                InitStrategy::Manual(manual_centroids.unwrap_or_else(|| Array2::zeros((0, 2))))
            }
        }
    }

    pub fn method(&self) -> InitMethod {
        match self {
            InitStrategy::Random => InitMethod::Random,
            InitStrategy::FarthestFirst => InitMethod::FarthestFirst,
            InitStrategy::KMeansPlusPlus => InitMethod::KMeansPlusPlus,
            InitStrategy::Manual(_) => InitMethod::Manual,
        }
    }

    /// Validate the inputs and produce the initial centroids.
    ///
    /// # Errors
    ///
    /// - `InvalidK` if `k == 0`, or `k > n_samples` for any method but `Manual`
    /// - `InvalidDimensions` if data or manual centroids are not 2-D points
    /// - `NonFiniteCoordinate` if any coordinate is NaN or infinite
    /// - `ManualCountMismatch` if the manual centroid count differs from `k`
    pub fn initialize<R: Rng + ?Sized>(
        &self,
        data: &ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Initialization, KMeansError> {
        validate_k(data.nrows(), k, self.method())?;
        validate_points(data, "point")?;

        let indices = match self {
            InitStrategy::Random => random_indices(data.nrows(), k, rng),
            InitStrategy::FarthestFirst => farthest_first_indices(data, k, rng),
            InitStrategy::KMeansPlusPlus => kmeans_plus_plus_indices(data, k, rng),
            InitStrategy::Manual(centroids) => {
                validate_points(&centroids.view(), "centroid")?;
                if centroids.nrows() != k {
                    return Err(KMeansError::ManualCountMismatch {
                        expected: k,
                        got: centroids.nrows(),
                    });
                }
                return Ok(Initialization {
                    centroids: centroids.clone(),
                    labels: None,
                });
            }
        };

        let centroids = data.select(Axis(0), &indices);
        let labels = assign_labels(data, &centroids.view());

        Ok(Initialization {
            centroids,
            labels: Some(labels),
        })
    }
}

fn validate_k(n_samples: usize, k: usize, method: InitMethod) -> Result<(), KMeansError> {
    if k == 0 {
        return Err(KMeansError::InvalidK("k must be at least 1".to_string()));
    }

    if method != InitMethod::Manual && k > n_samples {
        return Err(KMeansError::InvalidK(format!(
            "k ({}) exceeds the number of points ({})",
            k, n_samples
        )));
    }

    Ok(())
}

/// Check that `points` is an (n, 2) array of finite coordinates
pub(crate) fn validate_points(points: &ArrayView2<f64>, what: &str) -> Result<(), KMeansError> {
    if points.ncols() != 2 {
        return Err(KMeansError::InvalidDimensions(format!(
            "Expected 2 coordinates per {}, got {}",
            what,
            points.ncols()
        )));
    }

    if let Some(i) = points
        .outer_iter()
        .position(|row| row.iter().any(|v| !v.is_finite()))
    {
        return Err(KMeansError::NonFiniteCoordinate(format!(
            "{} {} is {:?}",
            what,
            i,
            points.row(i).to_vec()
        )));
    }

    Ok(())
}

/// k distinct indices from [0, n), uniformly without replacement
fn random_indices<R: Rng + ?Sized>(n_samples: usize, k: usize, rng: &mut R) -> Vec<usize> {
    let indices: Vec<usize> = (0..n_samples).collect();
    indices.choose_multiple(rng, k).cloned().collect()
}

fn farthest_first_indices<R: Rng + ?Sized>(
    data: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let first = rng.gen_range(0..data.nrows());
    farthest_first_from(data, k, first)
}

/// Farthest-point traversal starting at row `first`.
///
/// Each step takes the unchosen point whose squared distance to its nearest
/// chosen point is largest, lowest index on ties.
fn farthest_first_from(data: &ArrayView2<f64>, k: usize, first: usize) -> Vec<usize> {
    let mut seeds = SeedSet::new(data, first);

    while seeds.chosen.len() < k {
        let mut next = None;
        let mut best_dist = f64::NEG_INFINITY;

        for (i, &dist) in seeds.min_dists.iter().enumerate() {
            if !seeds.is_chosen[i] && dist > best_dist {
                best_dist = dist;
                next = Some(i);
            }
        }

        match next {
            Some(i) => seeds.push(data, i),
            None => break,
        }
    }

    seeds.chosen
}

/// k-means++ seeding: each new seed is drawn with probability proportional
/// to its squared distance from the nearest chosen seed.
///
/// When every weight is zero the remaining points all coincide with chosen
/// seeds, and the next seed is drawn uniformly from the unchosen points.
fn kmeans_plus_plus_indices<R: Rng + ?Sized>(
    data: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let first = rng.gen_range(0..data.nrows());
    let mut seeds = SeedSet::new(data, first);

    while seeds.chosen.len() < k {
        // Chosen points carry weight 0 and can never be drawn
        let next = match WeightedIndex::new(d2_weights(&seeds.min_dists)) {
            Ok(weighted) => weighted.sample(rng),
            Err(err) => {
                debug!(
                    seeds = seeds.chosen.len(),
                    "k-means++ weights unusable ({}), sampling uniformly",
                    err
                );
                let remaining: Vec<usize> = (0..data.nrows())
                    .filter(|&i| !seeds.is_chosen[i])
                    .collect();
                match remaining.choose(rng) {
                    Some(&i) => i,
                    None => break,
                }
            }
        };

        seeds.push(data, next);
    }

    seeds.chosen
}

/// Sampling weights for the next k-means++ seed.
///
/// Squared distances are used as-is when their total is finite. Otherwise they
/// are divided by the largest finite weight and overflowed distances count as
/// 1.0, which keeps the total finite for `WeightedIndex`.
fn d2_weights(min_dists: &[f64]) -> Vec<f64> {
    if min_dists.iter().sum::<f64>().is_finite() {
        return min_dists.to_vec();
    }

    let max_finite = min_dists
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max);

    min_dists
        .iter()
        .map(|&d| {
            if !d.is_finite() {
                1.0
            } else if max_finite > 0.0 {
                d / max_finite
            } else {
                0.0
            }
        })
        .collect()
}

/// Seeds chosen so far, with each point's squared distance to its nearest seed
struct SeedSet {
    chosen: Vec<usize>,
    is_chosen: Vec<bool>,
    min_dists: Vec<f64>,
}

impl SeedSet {
    fn new(data: &ArrayView2<f64>, first: usize) -> Self {
        let n_samples = data.nrows();
        let mut seeds = Self {
            chosen: Vec::new(),
            is_chosen: vec![false; n_samples],
            min_dists: vec![f64::INFINITY; n_samples],
        };
        seeds.push(data, first);
        seeds
    }

    fn push(&mut self, data: &ArrayView2<f64>, idx: usize) {
        self.chosen.push(idx);
        self.is_chosen[idx] = true;

        let seed = data.row(idx);
        for (point, min_dist) in data.outer_iter().zip(self.min_dists.iter_mut()) {
            *min_dist = min_dist.min(distance2(&point, &seed));
        }
        // Exact zero even if the point is duplicated elsewhere
        self.min_dists[idx] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn all_distinct(indices: &[usize]) -> bool {
        indices.iter().collect::<HashSet<_>>().len() == indices.len()
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in [
            InitMethod::Random,
            InitMethod::FarthestFirst,
            InitMethod::KMeansPlusPlus,
            InitMethod::Manual,
        ] {
            assert_eq!(method.as_str().parse::<InitMethod>().unwrap(), method);
        }
        assert!("spectral".parse::<InitMethod>().is_err());
    }

    #[test]
    fn test_random_indices_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..20 {
            let indices = random_indices(10, 10, &mut rng);
            assert_eq!(indices.len(), 10);
            assert!(all_distinct(&indices));
        }
    }

    #[test]
    fn test_farthest_first_picks_extremes() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [10.0, 0.0], [5.0, 0.0]];

        let indices = farthest_first_from(&data.view(), 3, 0);
        // 10 is farthest from 0, then 5 is farthest from {0, 10}
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn test_farthest_first_deterministic_given_first() {
        let data = Array2::random((200, 2), Uniform::new(-10.0, 10.0));

        let a = farthest_first_from(&data.view(), 8, 17);
        let b = farthest_first_from(&data.view(), 8, 17);
        assert_eq!(a, b);
        assert_eq!(a[0], 17);
        assert!(all_distinct(&a));
    }

    #[test]
    fn test_farthest_first_tie_takes_lowest_index() {
        // (-1,0) and (1,0) are both at distance 1 from the first seed
        let data = array![[0.0, 0.0], [-1.0, 0.0], [1.0, 0.0]];

        let indices = farthest_first_from(&data.view(), 2, 0);
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_farthest_first_with_duplicates_stays_distinct() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];

        let indices = farthest_first_from(&data.view(), 3, 1);
        assert_eq!(indices, vec![1, 0, 2]);
    }

    #[test]
    fn test_kmeans_plus_plus_distinct() {
        let data = Array2::random((100, 2), Uniform::new(-1.0, 1.0));
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..20 {
            let indices = kmeans_plus_plus_indices(&data.view(), 10, &mut rng);
            assert_eq!(indices.len(), 10);
            assert!(all_distinct(&indices));
        }
    }

    #[test]
    fn test_kmeans_plus_plus_all_weights_zero_falls_back() {
        let data = array![[2.0, 3.0], [2.0, 3.0], [2.0, 3.0], [2.0, 3.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let indices = kmeans_plus_plus_indices(&data.view(), 4, &mut rng);
        assert_eq!(indices.len(), 4);
        assert!(all_distinct(&indices));
    }

    #[test]
    fn test_kmeans_plus_plus_skips_coincident_points() {
        // Two well separated groups: once one seed sits in each group,
        // the second seed can only come from the other group
        let data = array![[0.0, 0.0], [0.0, 0.0], [50.0, 50.0], [50.0, 50.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..20 {
            let indices = kmeans_plus_plus_indices(&data.view(), 2, &mut rng);
            let groups: HashSet<bool> = indices.iter().map(|&i| i >= 2).collect();
            assert_eq!(groups.len(), 2);
        }
    }

    #[test]
    fn test_d2_weights_rescale_on_overflow() {
        let weights = d2_weights(&[0.0, f64::INFINITY, 1e300, 5e299]);
        assert_eq!(weights, vec![0.0, 1.0, 1.0, 0.5]);
        assert!(weights.iter().sum::<f64>().is_finite());

        let small = [0.0, 2.0, 3.0];
        assert_eq!(d2_weights(&small), small.to_vec());
    }

    #[test]
    fn test_kmeans_plus_plus_huge_coordinates() {
        // Squared distances between these points overflow to infinity
        let data = array![[0.0, 0.0], [1e200, 1e200], [-1e200, 5.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for _ in 0..10 {
            let indices = kmeans_plus_plus_indices(&data.view(), 3, &mut rng);
            assert_eq!(indices.len(), 3);
            assert!(all_distinct(&indices));
        }

        let init = InitStrategy::KMeansPlusPlus
            .initialize(&data.view(), 3, &mut rng)
            .unwrap();
        assert!(init.centroids.iter().all(|v| v.is_finite()));
        assert_eq!(init.labels.unwrap().len(), 3);
    }

    #[test]
    fn test_initialize_assigns_sampled_methods() {
        let data = Array2::random((50, 2), Uniform::new(-1.0, 1.0));
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for strategy in [
            InitStrategy::Random,
            InitStrategy::FarthestFirst,
            InitStrategy::KMeansPlusPlus,
        ] {
            let init = strategy.initialize(&data.view(), 4, &mut rng).unwrap();
            assert_eq!(init.centroids.dim(), (4, 2));

            let labels = init.labels.unwrap();
            assert_eq!(labels.len(), 50);
            assert!(labels.iter().all(|&l| l < 4));
        }
    }

    #[test]
    fn test_initialize_manual() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let centroids = array![[0.0, 0.0], [10.0, 0.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let init = InitStrategy::Manual(centroids.clone())
            .initialize(&data.view(), 2, &mut rng)
            .unwrap();

        assert_eq!(init.centroids, centroids);
        assert!(init.labels.is_none());
    }

    #[test]
    fn test_initialize_manual_count_mismatch() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let result = InitStrategy::Manual(array![[0.0, 0.0]]).initialize(&data.view(), 2, &mut rng);
        assert_eq!(
            result.unwrap_err(),
            KMeansError::ManualCountMismatch {
                expected: 2,
                got: 1
            }
        );

        let missing = InitStrategy::from_method(InitMethod::Manual, None);
        let result = missing.initialize(&data.view(), 2, &mut rng);
        assert!(matches!(
            result,
            Err(KMeansError::ManualCountMismatch { got: 0, .. })
        ));
    }

    #[test]
    fn test_manual_allows_k_above_n() {
        let data = array![[0.0, 0.0]];
        let centroids = array![[0.0, 0.0], [5.0, 5.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let result = InitStrategy::Manual(centroids).initialize(&data.view(), 2, &mut rng);
        assert!(result.is_ok());
    }

    #[test]
    fn test_initialize_invalid_k() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for strategy in [
            InitStrategy::Random,
            InitStrategy::FarthestFirst,
            InitStrategy::KMeansPlusPlus,
        ] {
            assert!(matches!(
                strategy.initialize(&data.view(), 0, &mut rng),
                Err(KMeansError::InvalidK(_))
            ));
            assert!(matches!(
                strategy.initialize(&data.view(), 3, &mut rng),
                Err(KMeansError::InvalidK(_))
            ));
        }

        let manual = InitStrategy::Manual(Array2::zeros((0, 2)));
        assert!(matches!(
            manual.initialize(&data.view(), 0, &mut rng),
            Err(KMeansError::InvalidK(_))
        ));
    }

    #[test]
    fn test_initialize_rejects_bad_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let three_d = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        assert!(matches!(
            InitStrategy::Random.initialize(&three_d.view(), 1, &mut rng),
            Err(KMeansError::InvalidDimensions(_))
        ));

        let with_nan = array![[0.0, 0.0], [f64::NAN, 1.0]];
        assert!(matches!(
            InitStrategy::Random.initialize(&with_nan.view(), 1, &mut rng),
            Err(KMeansError::NonFiniteCoordinate(_))
        ));

        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let bad_centroids = array![[f64::INFINITY, 0.0]];
        assert!(matches!(
            InitStrategy::Manual(bad_centroids).initialize(&data.view(), 1, &mut rng),
            Err(KMeansError::NonFiniteCoordinate(_))
        ));
    }
}
