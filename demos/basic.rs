//! Basic example stepping through a kmeans-session run
//!
//! Run with: cargo run --example basic --release

use kmeans_session::{ClusterSession, InitStrategy, SessionConfig};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    println!("=== kmeans-session example ===\n");

    let n_samples = 300;
    let n_clusters = 3;

    println!("Generating {} points around {} centers...", n_samples, n_clusters);

    // Create clustered data by generating points around 3 centers
    let mut data = Array2::<f64>::zeros((n_samples, 2));
    let centers = [[-5.0, -5.0], [0.0, 5.0], [5.0, -5.0]];

    let noise = Array2::random((n_samples, 2), Uniform::new(-1.0, 1.0));
    for i in 0..n_samples {
        let cluster_idx = i % 3;
        data[[i, 0]] = centers[cluster_idx][0] + noise[[i, 0]];
        data[[i, 1]] = centers[cluster_idx][1] + noise[[i, 1]];
    }

    println!("True cluster centers:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Cluster {}: ({:.2}, {:.2})", i, center[0], center[1]);
    }
    println!();

    let config = SessionConfig::new().with_seed(42).with_max_iters(100);
    let mut session = ClusterSession::with_config(config);

    println!("Initializing with k-means++ (k={})...", n_clusters);
    session
        .init(&data.view(), n_clusters, InitStrategy::KMeansPlusPlus)
        .expect("Initialization failed");
    print_centroids(&session);

    // Step a few times to watch the centroids move
    for _ in 0..3 {
        let converged = session.step().expect("Step failed");
        println!(
            "After step {} (inertia {:.3}):",
            session.iteration(),
            session.inertia().unwrap_or(0.0)
        );
        print_centroids(&session);
        if converged {
            break;
        }
    }

    let converged = session.converge_all().expect("Converge failed");
    println!(
        "{} after {} iterations:",
        if converged { "Converged" } else { "Stopped" },
        session.iteration()
    );
    print_centroids(&session);

    if let Some(sizes) = session.cluster_sizes() {
        println!("Cluster distribution:");
        for (i, count) in sizes.iter().enumerate() {
            println!(
                "  Cluster {}: {} points ({:.1}%)",
                i,
                count,
                (*count as f64 / n_samples as f64) * 100.0
            );
        }
    }

    println!("\n=== Done! ===");
}

fn print_centroids(session: &ClusterSession) {
    if let Some(centroids) = session.centroids() {
        for (i, c) in centroids.outer_iter().enumerate() {
            println!("  Centroid {}: ({:.4}, {:.4})", i, c[0], c[1]);
        }
    }
    println!();
}
