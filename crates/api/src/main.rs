use std::sync::Arc;

use anyhow::Context;

use stockroom_api::context::AppContext;
use stockroom_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::load().context("failed to load configuration")?;
    config.warn_insecure_defaults();

    let ctx = Arc::new(AppContext::from_config(&config)?);
    let app = stockroom_api::app::build_app(ctx);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
