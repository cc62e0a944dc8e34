//! Wiring shared by the binaries.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::{CatalogIndex, CatalogStore};
use tracker::{ExclusionTracker, RedisExclusionStore};
use worker_client::WorkerChannel;

use crate::config::ServiceArgs;
use crate::service::SelectionService;

const DEFAULT_LOG_FILTER: &str = "info,server=debug,sources=debug,pipeline=debug,worker_client=debug";

/// Initialise logging from `RUST_LOG`, falling back to `default_filter`
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn init_default_tracing() {
    init_tracing(DEFAULT_LOG_FILTER);
}

/// Load the catalog, connect the viewed-set store, and start the worker
pub async fn build_service(args: &ServiceArgs) -> Result<SelectionService> {
    info!("Loading catalog from {:?}...", args.catalog);
    let path = args.catalog.clone();
    let catalog = tokio::task::spawn_blocking(move || CatalogIndex::load_from_file(&path))
        .await
        .context("Catalog loading task panicked")?
        .with_context(|| format!("Failed to load catalog from {:?}", args.catalog))?;
    let catalog: Arc<dyn CatalogStore> = Arc::new(catalog);

    let tracker = match &args.redis_url {
        Some(url) => {
            let store = RedisExclusionStore::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            ExclusionTracker::new(Arc::new(store))
        }
        None => {
            info!("No REDIS_URL set, keeping viewed sets in memory");
            ExclusionTracker::in_memory()
        }
    };

    let channel = if args.no_worker {
        info!("Recommendation worker disabled, random path only");
        None
    } else {
        let config = args.worker_config();
        info!("Starting recommendation worker: {:?} {:?}", config.program, config.args);
        Some(WorkerChannel::start(config))
    };

    Ok(SelectionService::new(
        catalog,
        tracker,
        channel,
        args.selection_config(),
    ))
}
