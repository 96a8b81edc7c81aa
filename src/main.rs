use kassaflow::{AppState, ConfigBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build()?;
    kassaflow::init_tracing_with_config(&config);

    let addr = config.server.addr()?;
    let state = AppState::new(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Kassaflow listening");
    axum::serve(listener, kassaflow::http::router(state)).await?;
    Ok(())
}
