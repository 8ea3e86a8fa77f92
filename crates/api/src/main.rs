use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use tenantchat_api::app::{RouterOptions, build_app, services::AppServices};
use tenantchat_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tenantchat_observability::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let services = match AppServices::from_config(&config).await {
        Ok(services) => Arc::new(services),
        Err(e) => {
            tracing::error!(error = %format_args!("{e:#}"), "startup failed");
            std::process::exit(1);
        }
    };

    let app = build_app(services, RouterOptions::from(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, public_tenant_listing = config.public_tenant_listing, "listening");

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
