//! # kmeans-session
//!
//! Interactive k-means clustering over 2-D points, driven one call at a time.
//!
//! ## Features
//!
//! - **Four initializations**: random, farthest-first, k-means++ and manual
//!   (caller-supplied centroids)
//! - **Step-by-step Lloyd iterations**: advance a run one assign/update step at a
//!   time, or run it to convergence under an iteration cap
//! - **Exact convergence**: a run converges when a step changes neither the
//!   assignment nor any centroid
//! - **Reproducible**: sampled initializations draw from a seeded ChaCha RNG
//! - **ndarray compatible**: datasets and centroids are `Array2<f64>` of shape (n, 2)
//! - **Optional HTTP transport**: enable the `server` feature for a JSON API
//!
//! ## Example
//!
//! ```rust
//! use kmeans_session::{ClusterSession, InitStrategy, SessionConfig};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! let data = Array2::random((500, 2), Uniform::new(-1.0, 1.0));
//!
//! let mut session = ClusterSession::with_config(SessionConfig::new().with_seed(42));
//! session.init(&data.view(), 5, InitStrategy::KMeansPlusPlus).unwrap();
//!
//! // One Lloyd iteration at a time...
//! let converged = session.step().unwrap();
//!
//! // ...or straight to the fixed point
//! if !converged {
//!     session.converge_all().unwrap();
//! }
//!
//! let labels = session.assignments().unwrap();
//! assert_eq!(labels.len(), 500);
//! ```
//!
//! ## Manual Initialization
//!
//! ```rust
//! use kmeans_session::{ClusterSession, InitStrategy, SessionPhase};
//! use ndarray::array;
//!
//! let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//!
//! let mut session = ClusterSession::new();
//! session
//!     .init(&data.view(), 2, InitStrategy::Manual(array![[0.0, 0.0], [10.0, 0.0]]))
//!     .unwrap();
//!
//! // No assignment until the first step
//! assert!(session.assignments().is_none());
//!
//! session.converge_all().unwrap();
//! assert_eq!(session.phase(), SessionPhase::Converged);
//! ```

mod algorithm;
pub mod api;
mod config;
mod distance;
mod error;
mod init;
#[cfg(feature = "server")]
pub mod server;
mod session;

pub use config::SessionConfig;
pub use error::KMeansError;
pub use init::{InitMethod, InitStrategy, Initialization};
pub use session::{ClusterSession, SessionPhase};
