use ip_reputation_dashboard::AppResources;
use ip_reputation_dashboard::api::start_webserver;
use ip_reputation_dashboard::config::load_config;
use ip_reputation_dashboard::db::DbClient;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_standard_tracing() {
    let default_directives = "ip_reputation_dashboard=info,tower_http=info,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    initialize_standard_tracing();

    let config = Arc::new(load_config()?);
    tracing::info!(
        listen_addr = %config.listen_addr,
        database = ?config.database,
        "configuration loaded"
    );

    let db = DbClient::connect(&config.database).await?;

    let resources = AppResources { db, config };
    start_webserver(resources).await?;
    Ok(())
}
