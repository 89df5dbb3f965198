mod routes;
mod singleton;
mod state;

use anyhow::Result;
use axum::Router;
use mailcal_core::AssistantConfig;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::ui::router())
        .merge(routes::run::router())
        .merge(routes::auth::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Ensure only one instance is running
    let _lock = singleton::acquire_lock(&singleton::lock_path()?)?;

    let config = AssistantConfig::load()?;
    let addr = config.server.socket_addr()?;
    let state = AppState::new(config)?;

    info!("mailcal-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
