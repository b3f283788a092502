use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chain_core::constants::{MINING_REWARD, MINING_SENDER};
use chain_core::{
    Block, ChainError, ChainValidator, ConsensusResolver, HashAlgorithm, Ledger, NodeRegistry,
    ProofOfWork, Transaction,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Everything a request handler needs. The ledger and the registry each sit
/// behind one exclusive lock; "read tip, drain pool, append block" happens as
/// a unit under the ledger lock.
pub struct AppState {
    ledger: Mutex<Ledger>,
    registry: Mutex<NodeRegistry>,
    pow: ProofOfWork,
    resolver: ConsensusResolver,
    node_id: String,
    client: reqwest::Client,
}

impl AppState {
    pub fn new(algorithm: HashAlgorithm, difficulty: usize, node_id: String) -> Self {
        let pow = ProofOfWork::new(algorithm, difficulty);
        Self {
            ledger: Mutex::new(Ledger::new(algorithm)),
            registry: Mutex::new(NodeRegistry::default()),
            pow,
            resolver: ConsensusResolver::new(ChainValidator::new(pow)),
            node_id,
            client: reqwest::Client::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

/// 32 hex characters of process identity, credited as the mining-reward
/// receiver.
pub fn random_node_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

#[derive(Deserialize)]
struct TxRequest {
    sender: Option<String>,
    receiver: Option<String>,
    amount: Option<u64>,
}

#[derive(Serialize)]
struct MineResponse {
    message: String,
    index: u64,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Deserialize)]
struct RegisterRequest {
    nodes: Option<Vec<String>>,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: String,
    total_nodes: usize,
}

#[derive(Serialize)]
struct ResolveResponse {
    message: String,
    chain: Vec<Block>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Message {
            message: message.into(),
        }),
    )
        .into_response()
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn new_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TxRequest>,
) -> Response {
    let (Some(sender), Some(receiver), Some(amount)) = (req.sender, req.receiver, req.amount)
    else {
        return error_response(StatusCode::BAD_REQUEST, "missing transaction values");
    };
    let queued = state
        .ledger
        .lock()
        .expect("ledger mutex poisoned")
        .add_transaction(&sender, &receiver, amount);
    match queued {
        Ok(index) => (
            StatusCode::CREATED,
            Json(Message {
                message: format!("Transaction will be added to block {index}"),
            }),
        )
            .into_response(),
        Err(err @ ChainError::InvalidTransaction(_)) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

async fn mine(State(state): State<Arc<AppState>>) -> Response {
    loop {
        let (tip_index, last_proof) = {
            let ledger = state.ledger.lock().expect("ledger mutex poisoned");
            match ledger.last_block() {
                Ok(last) => (last.index, last.proof),
                Err(err) => {
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                }
            }
        };

        // The search is CPU-bound; run it off the runtime and outside the
        // lock so transactions keep flowing while we grind.
        let pow = state.pow;
        let proof = match tokio::task::spawn_blocking(move || pow.mine(last_proof)).await {
            Ok(proof) => proof,
            Err(err) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("mining task failed: {err}"),
                )
            }
        };

        let mut ledger = state.ledger.lock().expect("ledger mutex poisoned");
        match ledger.last_block() {
            Ok(last) if last.index != tip_index => {
                // Another block landed while we were searching; the proof no
                // longer chains from the tip.
                info!(
                    expected = tip_index,
                    found = last.index,
                    "tip advanced during mining, restarting the search"
                );
                continue;
            }
            Ok(_) => {}
            Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }

        let forged = ledger
            .add_transaction(MINING_SENDER, &state.node_id, MINING_REWARD)
            .and_then(|_| ledger.new_block(proof, None));
        return match forged {
            Ok(block) => (
                StatusCode::OK,
                Json(MineResponse {
                    message: "New block forged".to_string(),
                    index: block.index,
                    transactions: block.transactions,
                    proof: block.proof,
                    previous_hash: block.previous_hash,
                }),
            )
                .into_response(),
            Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
    }
}

async fn chain(State(state): State<Arc<AppState>>) -> Json<ChainResponse> {
    let ledger = state.ledger.lock().expect("ledger mutex poisoned");
    Json(ChainResponse {
        chain: ledger.blocks().to_vec(),
        length: ledger.len(),
    })
}

async fn register_nodes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let nodes = req.nodes.unwrap_or_default();
    if nodes.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "please supply a list of nodes");
    }
    let mut registry = state.registry.lock().expect("registry mutex poisoned");
    for node in &nodes {
        if let Err(err) = registry.register(node) {
            return error_response(StatusCode::BAD_REQUEST, err.to_string());
        }
    }
    (
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "New nodes have been added".to_string(),
            total_nodes: registry.len(),
        }),
    )
        .into_response()
}

async fn resolve(State(state): State<Arc<AppState>>) -> Response {
    let peers: Vec<String> = {
        let registry = state.registry.lock().expect("registry mutex poisoned");
        registry.iter().cloned().collect()
    };

    let mut candidates = Vec::new();
    for peer in peers {
        match fetch_peer_chain(&state.client, &peer).await {
            Ok(chain) => candidates.push(chain),
            Err(err) => warn!(%peer, "failed to fetch peer chain: {err:#}"),
        }
    }

    let local = {
        let ledger = state.ledger.lock().expect("ledger mutex poisoned");
        ledger.blocks().to_vec()
    };
    let winner = state.resolver.resolve(&local, candidates);

    let mut ledger = state.ledger.lock().expect("ledger mutex poisoned");
    let message = match winner {
        // Re-check under the lock: the local chain may have grown while the
        // peers were being polled.
        Some(chain) if chain.len() > ledger.len() => {
            ledger.replace(chain);
            info!(length = ledger.len(), "adopted a longer peer chain");
            "Our chain was replaced"
        }
        _ => "Our chain is authoritative",
    };
    (
        StatusCode::OK,
        Json(ResolveResponse {
            message: message.to_string(),
            chain: ledger.blocks().to_vec(),
        }),
    )
        .into_response()
}

async fn fetch_peer_chain(client: &reqwest::Client, authority: &str) -> anyhow::Result<Vec<Block>> {
    let url = format!("http://{authority}/chain");
    let response = client.get(&url).send().await?.error_for_status()?;
    let body: ChainResponse = response.json().await?;
    Ok(body.chain)
}
