//! PipChat server entry point
//!
//! Parses flags, binds the listener, starts the operator console, and
//! accepts connections until ctrl-c.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipchat::{console, ChatServer, Cli, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default level, e.g. RUST_LOG=pipchat=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipchat=info")),
        )
        .init();

    let args = Cli::parse();

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!(port = args.port, "accepting connections");

    let config = ServerConfig {
        safe_mode: args.safe_mode,
        queue_capacity: args.queue_capacity,
    };
    let server = ChatServer::new(listener, config);

    // Lines typed on this terminal go out to every connected client.
    tokio::spawn(console::run(server.queue(), args.operator_name));

    server.run_until_ctrl_c().await;
    Ok(())
}
