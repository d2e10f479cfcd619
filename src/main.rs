use anyhow::Result;
use bookshelf_catalog::{config::Parser, server, CatalogConfig, GraphQueryExecutor, MemoryGraph};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
pub async fn main() -> Result<()> {
    let filter = match std::env::var_os("RUST_LOG") {
        Some(_) => EnvFilter::try_from_default_env()?,
        None => EnvFilter::new("info"),
    };

    tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = CatalogConfig::parse();
    info!("Configuration: {:?}", config);

    let graph = match &config.seed {
        Some(path) => MemoryGraph::load(path).await?,
        None => MemoryGraph::new(),
    };
    info!(
        nodes = graph.node_count().await,
        edges = graph.edge_count().await,
        "graph ready"
    );

    let executor: Arc<dyn GraphQueryExecutor> = Arc::new(graph);
    server::serve(&config, executor).await?;
    Ok(())
}
