mod blob;
mod block;
mod conversation;
mod error;
mod message;
mod routes;
mod state;
mod websocket;

use routes::create_router;
use state::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,duochat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration and build application state
    let config = Config::from_env();
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config);

    // Create router
    let app = create_router(state);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
