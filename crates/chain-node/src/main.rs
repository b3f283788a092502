use chain_core::constants::DEFAULT_DIFFICULTY;
use chain_core::HashAlgorithm;
use chain_node::{app, random_node_id, AppState};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Digest algorithm for block hashing and proofs (sha256 or keccak256)
    #[arg(long, default_value = "sha256")]
    algorithm: HashAlgorithm,

    /// Leading zero hex characters required of a valid proof
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,

    /// Identity credited with mining rewards; random when omitted
    #[arg(long)]
    node_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let node_id = args.node_id.unwrap_or_else(random_node_id);
    let state = Arc::new(AppState::new(args.algorithm, args.difficulty, node_id));

    let addr: SocketAddr = args.listen.parse()?;
    info!(
        node_id = state.node_id(),
        algorithm = %args.algorithm,
        difficulty = args.difficulty,
        "chain-node listening on http://{addr}"
    );
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app(state)).await?;
    Ok(())
}
