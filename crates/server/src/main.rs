//! Painting selection HTTP server.
//!
//! Serves the selection, viewed-acknowledgement, session, and worker
//! endpoints, and supervises the recommendation worker for its lifetime.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use server::app::{build_service, init_default_tracing};
use server::{AppState, ServiceArgs};

#[derive(Parser, Debug)]
#[command(name = "painting-server")]
#[command(about = "Painting selection service", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    #[command(flatten)]
    service: ServiceArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_default_tracing();
    let cli = Cli::parse();

    let service = build_service(&cli.service).await?;
    let routes = server::routes::build(AppState::new(service.clone()));

    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port)))
        .await
        .with_context(|| format!("Failed to bind port {}", cli.port))?;
    info!("Painting server listening on {}", listener.local_addr()?);

    axum::serve(listener, routes)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("Server error")?;

    service.shutdown().await;
    info!("Painting server stopped");
    Ok(())
}
