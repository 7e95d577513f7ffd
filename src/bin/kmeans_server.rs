//! HTTP server exposing one interactive clustering session.
//!
//! Run with: cargo run --features server --bin kmeans-server -- --port 3001

use clap::Parser;
use kmeans_session::server::create_router;
use kmeans_session::SessionConfig;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kmeans-server")]
#[command(about = "Serve an interactive k-means session over HTTP")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "KMEANS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "KMEANS_PORT", default_value_t = 3001)]
    port: u16,

    /// Seed for the random, farthest_first and kmeans++ initializations
    #[arg(long, env = "KMEANS_SEED", default_value_t = 0)]
    seed: u64,

    /// Iteration cap for a single converge request
    #[arg(long, env = "KMEANS_MAX_ITERS", default_value_t = 300)]
    max_iters: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = SessionConfig::new()
        .with_seed(cli.seed)
        .with_max_iters(cli.max_iters);
    let app = create_router(config);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, seed = cli.seed, max_iters = cli.max_iters, "kmeans server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
