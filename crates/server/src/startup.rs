use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::{AppConfig, StorageBackend};
use service::address::ViaCepClient;
use service::auth::AuthConfig;
use service::local_store::LocalStore;
use service::runtime::{self, Repositories};

use crate::errors::StartupError;
use crate::routes::{self, RouterOptions};
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

async fn build_repositories(cfg: &AppConfig) -> Result<Repositories, StartupError> {
    match cfg.portal.backend {
        StorageBackend::Memory => {
            warn!("memory backend selected; data is lost on restart");
            Ok(Repositories::memory())
        }
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database)
                .await
                .map_err(|e| StartupError::Database(e.to_string()))?;
            if cfg.database.run_migrations {
                Migrator::up(&db, None).await.map_err(|e| StartupError::Database(e.to_string()))?;
                info!("migrations applied");
            }
            Ok(Repositories::postgres(db))
        }
    }
}

/// Wire repositories, the local store and the CEP client into handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let repos = build_repositories(cfg).await?;
    let local = LocalStore::open(&cfg.portal.data_dir)
        .await
        .map_err(|e| StartupError::Any(anyhow::anyhow!("local store: {e}")))?;
    let address = ViaCepClient::new(&cfg.address_lookup).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(ServerState::new(repos, AuthConfig::from_portal(&cfg.portal), local, Arc::new(address)))
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run_until<F>(shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    dotenv().ok();
    let cfg = AppConfig::load_or_default().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    common::utils::logging::init_logging(&cfg.server.log_format);

    runtime::ensure_env(&cfg.portal.frontend_dir, &cfg.portal.data_dir).await?;

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors(), RouterOptions::from_config(&cfg));

    if let Some(admin_addr) = cfg.server.admin_addr.as_deref() {
        common::admin_http::spawn_admin_server(admin_addr, common::metrics::encode_metrics);
    }

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, backend = ?cfg.portal.backend, "portal listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(anyhow::Error::from)?;
    info!("portal stopped");
    Ok(())
}

/// Public entry: serve until Ctrl+C.
pub async fn run() -> Result<(), StartupError> {
    run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c handler unavailable; running until killed");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    })
    .await
}
