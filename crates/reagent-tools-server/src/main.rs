use anyhow::Result;
use reagent::mcp::McpServer;
use reagent::randoms;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs must go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = Arc::new(randoms::registry()?);
    tracing::info!(tools = registry.len(), "tool server listening on stdio");

    let server = McpServer::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), registry);
    server.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}
