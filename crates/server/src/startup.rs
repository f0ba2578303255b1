use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use configs::{AppConfig, ResourceConfig, StorageBackend};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::exchange::{ExchangeService, RateTable};
use service::provider::{JsonFileProvider, MemoryProvider, PersistenceProvider};
use service::{runtime, Record, ResourceSchema, ResourceStore};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load config from `CONFIG_PATH` (default `config.toml`); fall back to built-in
/// defaults plus `SERVER_HOST` / `SERVER_PORT` when no file is present.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let mut cfg = match configs::load_default() {
        Ok(cfg) => cfg,
        Err(e) if is_missing_file(&e) => {
            info!(error = %e, "no config file; using defaults");
            AppConfig::from_env()
        }
        Err(e) => return Err(e),
    };
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn seed_records(resource: &ResourceConfig) -> Result<Vec<Record>, StartupError> {
    resource
        .seed
        .iter()
        .map(|table| {
            serde_json::to_value(table)
                .and_then(serde_json::from_value::<Record>)
                .map_err(|e| StartupError::InvalidConfig(format!("seed for `{}`: {}", resource.name, e)))
        })
        .collect()
}

async fn build_provider(cfg: &AppConfig, resource: &ResourceConfig) -> Result<Arc<dyn PersistenceProvider>, StartupError> {
    match cfg.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryProvider::with_records(seed_records(resource)?))),
        StorageBackend::JsonFile => {
            if !resource.seed.is_empty() {
                warn!(resource = %resource.name, "seed records are only loaded by the memory backend");
            }
            let path = Path::new(&cfg.storage.data_dir).join(format!("{}.json", resource.name));
            let provider = JsonFileProvider::open(path)
                .await
                .map_err(|e| StartupError::Any(anyhow::anyhow!("open {}: {}", resource.name, e)))?;
            Ok(Arc::new(provider))
        }
    }
}

/// Assemble stores and services from configuration.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    if cfg.storage.backend == StorageBackend::JsonFile {
        runtime::ensure_data_dir(&cfg.storage.data_dir).await?;
    }

    let mut stores = Vec::with_capacity(cfg.resources.len());
    for resource in &cfg.resources {
        let schema = ResourceSchema::new(resource.name.clone()).require(resource.required_fields.iter().cloned());
        let provider = build_provider(cfg, resource).await?;
        info!(resource = %resource.name, backend = ?cfg.storage.backend, "resource store ready");
        stores.push(ResourceStore::new(schema, provider));
    }

    let rates = RateTable::new(cfg.exchange.rates.iter().map(|(k, v)| (k.as_str(), *v)))
        .map_err(|e| StartupError::InvalidConfig(format!("exchange rates: {}", e)))?;
    if rates.is_empty() {
        info!("no exchange rates configured; only same-currency conversions succeed");
    }
    Ok(ServerState::new(stores, ExchangeService::new(rates)))
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Build the app from `cfg` and serve it until the listener fails.
pub async fn serve(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, resources = cfg.resources.len(), backend = ?cfg.storage.backend, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
