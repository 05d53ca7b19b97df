use anyhow::Result;
use encounter_capture::{create_router, AppState, Config, ServiceClients};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/encounter-capture")?;

    info!("Encounter Capture v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let clients = ServiceClients::from_config(&cfg.services)?;

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(clients, cfg);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}
