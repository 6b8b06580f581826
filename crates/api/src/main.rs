use anyhow::Context;

use ledgerly_api::app::{build_app, AppServices};
use ledgerly_api::config::ApiConfig;
use ledgerly_auth::JwtManager;
use ledgerly_infra::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    ledgerly_observability::init(config.log_format);

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let db = Database::connect(DbConfig::new(config.database_url.clone()).max_connections(config.db_max_connections))
        .await
        .context("failed to open database")?;

    let services = AppServices::new(db, JwtManager::new(&config.jwt_secret, config.jwt_ttl_secs));
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
