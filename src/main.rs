use clap::Parser;
use sharded_kvs::config::{Args, NodeConfig};
use sharded_kvs::node::KvsNode;
use sharded_kvs::server;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = NodeConfig::from(&args);

    if config.view.is_empty() {
        tracing::warn!("Starting with an empty view; waiting for a view change");
    } else {
        tracing::info!(
            "Starting node {} in view {:?} (repl factor {})",
            config.address,
            config.view,
            config.repl_factor
        );
    }

    let node = KvsNode::new(config);
    let listener = TcpListener::bind(args.bind).await?;

    server::serve(listener, node, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    })
    .await?;

    Ok(())
}
