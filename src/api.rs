//! JSON request/response contract for driving a [`ClusterSession`].
//!
//! Points travel as `[x, y]` pairs. Field names match what clients already
//! send and expect, so they are part of the compatibility surface.

use crate::error::KMeansError;
use crate::init::{InitMethod, InitStrategy};
use crate::session::ClusterSession;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A 2-D point on the wire
pub type Point = [f64; 2];

/// Body of an init request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitRequest {
    pub points: Vec<Point>,
    /// Signed so that zero and negative values reach validation as `InvalidK`
    pub k: i64,
    pub init_method: InitMethod,
    /// Caller-chosen centroids, used only by `manual`
    #[serde(default, alias = "manual_centroids", skip_serializing_if = "Option::is_none")]
    pub centroids: Option<Vec<Point>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub centroids: Vec<Point>,
    /// Empty after a manual init
    pub assignments: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub centroids: Vec<Point>,
    pub assignments: Vec<usize>,
    pub has_converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergeResponse {
    pub centroids: Vec<Point>,
    pub assignments: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
}

/// Error body: a human-readable message plus the stable kind tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl From<&KMeansError> for ErrorResponse {
    fn from(err: &KMeansError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

/// Convert wire points into an (n, 2) array
pub fn points_to_array(points: &[Point]) -> Array2<f64> {
    let mut array = Array2::zeros((points.len(), 2));
    for (i, point) in points.iter().enumerate() {
        array[[i, 0]] = point[0];
        array[[i, 1]] = point[1];
    }
    array
}

/// Convert an (n, 2) array into wire points
pub fn array_to_points(array: &Array2<f64>) -> Vec<Point> {
    array.outer_iter().map(|row| [row[0], row[1]]).collect()
}

fn labels_to_vec(labels: Option<&Array1<usize>>) -> Vec<usize> {
    labels.map(|l| l.to_vec()).unwrap_or_default()
}

impl ClusterSession {
    /// Handle an init request.
    pub fn handle_init(&mut self, request: &InitRequest) -> Result<InitResponse, KMeansError> {
        let k = usize::try_from(request.k)
            .ok()
            .filter(|&k| k >= 1)
            .ok_or_else(|| {
                KMeansError::InvalidK(format!("k must be at least 1, got {}", request.k))
            })?;

        let manual = match (request.init_method, &request.centroids) {
            (InitMethod::Manual, Some(centroids)) => Some(points_to_array(centroids)),
            (InitMethod::Manual, None) => None,
            (method, Some(centroids)) => {
                debug!(
                    %method,
                    count = centroids.len(),
                    "ignoring centroids supplied for a sampled init method"
                );
                None
            }
            (_, None) => None,
        };

        let data = points_to_array(&request.points);
        self.init(
            &data.view(),
            k,
            InitStrategy::from_method(request.init_method, manual),
        )?;

        Ok(InitResponse {
            centroids: self.centroids().map(array_to_points).unwrap_or_default(),
            assignments: labels_to_vec(self.assignments()),
        })
    }

    /// Handle a step request.
    pub fn handle_step(&mut self) -> Result<StepResponse, KMeansError> {
        let has_converged = self.step()?;

        Ok(StepResponse {
            centroids: self.centroids().map(array_to_points).unwrap_or_default(),
            assignments: labels_to_vec(self.assignments()),
            has_converged,
        })
    }

    /// Handle a converge request.
    pub fn handle_converge(&mut self) -> Result<ConvergeResponse, KMeansError> {
        self.converge_all()?;

        Ok(ConvergeResponse {
            centroids: self.centroids().map(array_to_points).unwrap_or_default(),
            assignments: labels_to_vec(self.assignments()),
        })
    }

    /// Handle a reset request.
    pub fn handle_reset(&mut self) -> ResetResponse {
        self.reset();

        ResetResponse {
            status: "reset".to_string(),
        }
    }
}
