use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use seedbank_generate::{CompletionBackend, OpenAiBackend};
use seedbank_server::{AppState, Config, build_router};
use seedbank_store::DatasetStore;

#[derive(Debug, Error)]
enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Parser, Debug)]
#[command(name = "seedbank-server", version, about = "Seedbank dataset & seed service")]
struct Cli {
    /// Bind address; overrides APP_HOST.
    #[arg(long)]
    host: Option<String>,
    /// Bind port; overrides APP_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let db = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .min_connections(config.db_pool_min)
                .max_connections(config.db_pool_max)
                .acquire_timeout(Duration::from_secs(30))
                .connect_lazy(url)?;
            if let Err(err) = seedbank_events::ensure_schema(&pool).await {
                warn!(error = %err, "events schema bootstrap failed, event writes may error");
            }
            Some(pool)
        }
        None => {
            warn!("DATABASE_URL not set, event endpoints will answer 503");
            None
        }
    };

    let backend: Option<Arc<dyn CompletionBackend>> = match OpenAiBackend::from_env() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(_) => {
            warn!("OPENAI_API_KEY not set, generation endpoints will answer 500");
            None
        }
    };

    let store = DatasetStore::new(&config.data_base_path);
    let addr = format!("{}:{}", config.host, config.port);
    info!(
        addr = %addr,
        data_root = %config.data_base_path.display(),
        dynamic_v2 = config.dynamic_v2_mode,
        "seedbank server starting"
    );

    let app = build_router(AppState::new(config, db, store, backend));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
