use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use practice_server::config::{Config, LogFormat, StoreBackend};
use practice_server::store::{FallbackStore, MemoryStore, MySqlStore, Store};
use practice_server::{app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;

    init_tracing(config.log_format);

    let store = build_store(&config).await?;
    tracing::info!(store = store.name(), "data access layer ready");

    let addr = config.bind_addr();
    let state = AppState::new(config, store).context("failed to build HTTP client")?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "listening on http://{}", addr);

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    if config.skip_store {
        tracing::info!("SKIP_STORE is set, serving dummy data");
        return Ok(Arc::new(FallbackStore::new()));
    }

    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::MySql => {
            let pool = db::init_db(&config.database_url, config.database_max_connections)
                .await
                .context("failed to connect to the database")?;
            db::ensure_schema(&pool)
                .await
                .context("failed to create the database schema")?;
            Ok(Arc::new(MySqlStore::new(pool)))
        }
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("practice_server=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
