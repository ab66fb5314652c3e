//! Helm chart registry server

use std::net::SocketAddr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use helm_registry::{MemoryStore, RegistryBuilder, RegistryConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Serve synthetic Helm charts over the OCI distribution API")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let addr = config.bind;
    let app = RegistryBuilder::new()
        .store(Arc::new(MemoryStore::new()))
        .config(config)
        .build();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Helm registry listening on http://{}", addr);
    tracing::info!("Try: curl http://{}/v2/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Helm registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
