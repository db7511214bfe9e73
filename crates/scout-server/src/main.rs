mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Result;
use configuration::Settings;
use scout::gateway::Gateway;
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    // Configuration and the gateway are built once; a missing API key stops
    // the process before it serves anything.
    let settings = Settings::new()?;
    let gateway = Gateway::new(settings.gateway_config())?;
    let state = AppState::new(gateway);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
