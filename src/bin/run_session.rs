//! Binary for running a clustering session over a dataset stored as .npy
//!
//! Reads an (n, 2) f64 array, initializes a session, runs it to convergence,
//! and saves the final centroids to another .npy file.
//!
//! Usage: `run-session <input.npy> <output.npy> <k> <init_method> <seed> <max_iters>`

use kmeans_session::{ClusterSession, InitMethod, InitStrategy, SessionConfig};
use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::env;
use std::fs::File;
use std::io::BufReader;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 7 {
        eprintln!(
            "Usage: {} <input.npy> <output.npy> <k> <init_method> <seed> <max_iters>",
            program_name(&args)
        );
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let k: usize = args[3].parse()?;
    let method: InitMethod = args[4].parse()?;
    let seed: u64 = args[5].parse()?;
    let max_iters: usize = args[6].parse()?;

    if method == InitMethod::Manual {
        let message = "manual initialization needs caller-supplied centroids; \
                       use random, farthest_first or kmeans++";
        return Err(message.into());
    }

    // Read input data
    let reader = BufReader::new(File::open(input_path)?);
    let data: Array2<f64> = Array2::read_npy(reader)?;

    eprintln!("Loaded data: {} points x {} coordinates", data.nrows(), data.ncols());
    eprintln!(
        "Running session with k={}, init_method={}, seed={}, max_iters={}",
        k, method, seed, max_iters
    );

    let config = SessionConfig::new().with_seed(seed).with_max_iters(max_iters);
    let mut session = ClusterSession::with_config(config);

    session.init(&data.view(), k, InitStrategy::from_method(method, None))?;
    let converged = session.converge_all()?;

    eprintln!(
        "{} after {} iterations",
        if converged { "Converged" } else { "Stopped at the iteration cap" },
        session.iteration()
    );
    if let Some(inertia) = session.inertia() {
        eprintln!("Inertia: {:.6}", inertia);
    }

    let centroids = session.centroids().ok_or("No centroids after converging")?;

    let writer = File::create(output_path)?;
    centroids.write_npy(writer)?;

    eprintln!("Saved centroids to {}", output_path);

    Ok(())
}

/// Name to show in the usage line; `args` can be empty when the binary is
/// launched without argv[0]
fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("run-session")
}
