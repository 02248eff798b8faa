mod conf;
mod error;
mod handler;

use std::sync::Arc;

pub use conf::Config;
pub use error::GatewayError;
pub use handler::build_router;

use citydash_observability::{TracingConfig, setup_tracing};
use citydash_shard::mssql::MssqlConnector;
use citydash_shard::{PoolManager, ShardExecutor, ShardRegistry};
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn start_server(
    config: Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    setup_tracing(TracingConfig::from_env("citydash-gateway"))?;

    let registry = Arc::new(ShardRegistry::from_env(&config.shard_decls()?));
    if registry.is_empty() {
        warn!("no shard has complete connection parameters; every listing will be empty");
    }
    let connector = Arc::new(MssqlConnector::new(config.pool_config()));
    let pools = Arc::new(PoolManager::new(registry, connector));
    let executor = ShardExecutor::new(pools.clone(), config.shard_timeout());

    let router = handler::build_router(executor);
    let listener =
        TcpListener::bind(format!("0.0.0.0:{}", config.http_port)).await?;
    info!("start server on port {:?}", config.http_port);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pools.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
