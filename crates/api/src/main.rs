use anyhow::Context;

use devcamper_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    devcamper_observability::init();

    let config = AppConfig::from_env()?;
    let addr = format!("0.0.0.0:{}", config.port);

    let app = devcamper_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
