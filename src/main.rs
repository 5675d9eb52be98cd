//! BrandVault -- brand catalog service.
//!
//! Startup is idempotent: schema init and directory creation run on
//! every boot.  SIGTERM/SIGINT handlers only stop accepting connections
//! and wait for in-flight requests before exiting.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

/// Command-line arguments for the BrandVault server.
#[derive(Parser, Debug)]
#[command(
    name = "brandvault",
    version,
    about = "Brand catalog service: logo blob storage plus a brand table behind a small HTTP API"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "brandvault.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing / logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {}", cli.config);
    let config = brandvault::config::load_config(&cli.config)?;

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    // Initialize Prometheus metrics recorder and register metric descriptions.
    brandvault::metrics::init_metrics();
    brandvault::metrics::describe_metrics();
    info!("Prometheus metrics initialized");

    // Initialize the catalog store based on config.
    let catalog: Arc<dyn brandvault::catalog::store::CatalogStore> =
        match config.catalog.engine.as_str() {
            "memory" => {
                info!("In-memory catalog store initialized");
                Arc::new(brandvault::catalog::memory::MemoryCatalogStore::new())
            }
            "sqlite" | _ => {
                let catalog_path = &config.catalog.sqlite.path;
                // Ensure parent directory exists for the SQLite file.
                if let Some(parent) = std::path::Path::new(catalog_path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let store = brandvault::catalog::sqlite::SqliteCatalogStore::new(catalog_path)?;
                info!("SQLite catalog store initialized at {}", catalog_path);
                Arc::new(store)
            }
        };

    // Initialize the blob store based on config.
    let blobs: Arc<dyn brandvault::storage::backend::BlobStore> =
        match config.storage.backend.as_str() {
            "memory" => {
                let max = config.storage.memory.max_size_bytes;
                info!("In-memory blob store initialized (max_size_bytes={max})");
                Arc::new(brandvault::storage::memory::MemoryBlobStore::new(max))
            }
            "local" | _ => {
                let storage_root = &config.storage.local.root_dir;
                let store = brandvault::storage::local::LocalBlobStore::new(storage_root)?;
                info!("Local blob store initialized at {}", storage_root);
                Arc::new(store)
            }
        };

    // Build the service with its adapters injected, then AppState.
    let service = brandvault::service::BrandCatalog::new(
        catalog,
        blobs.clone(),
        config.storage.public_base_url.clone(),
    );

    let state = Arc::new(brandvault::AppState {
        config: config.clone(),
        service,
        blobs,
    });

    let app = brandvault::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("BrandVault listening on {}", bind_addr);

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections,
    // wait for in-flight requests to complete, then exit.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("BrandVault shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
