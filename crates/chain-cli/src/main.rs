use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chain-cli")]
#[command(about = "CLI client for a running chain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction for the next mined block
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        receiver: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine the next block
    Mine,
    /// Print the full chain
    Chain,
    /// Register peer nodes for conflict resolution
    RegisterNodes {
        /// Peer addresses, e.g. http://127.0.0.1:8081
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Run the longest-chain conflict resolution against registered peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: u64,
}

async fn print_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let body = response.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node;
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Submit {
            sender,
            receiver,
            amount,
        } => {
            let tx = Tx {
                sender,
                receiver,
                amount,
            };
            let res = client
                .post(format!("{node}/transactions/new"))
                .json(&tx)
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Mine => {
            let res = client.get(format!("{node}/mine")).send().await?;
            print_response(res).await?;
        }
        Command::Chain => {
            let res = client.get(format!("{node}/chain")).send().await?;
            print_response(res).await?;
        }
        Command::RegisterNodes { peers } => {
            let res = client
                .post(format!("{node}/nodes/register"))
                .json(&serde_json::json!({ "nodes": peers }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Resolve => {
            let res = client.get(format!("{node}/nodes/resolve")).send().await?;
            print_response(res).await?;
        }
    }
    Ok(())
}
