use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use authhooks::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let cfg = ServerConfig::from_env()?;
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "authhooks",
        "authhooks starting: RUST_LOG='{}', http_port={}, auth={:?}",
        rust_log, cfg.http_port, cfg.auth
    );

    authhooks::server::run(cfg).await
}
