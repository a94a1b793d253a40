use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_server::config::AppConfig;
use trivia_server::question::OpenTdbQuestionProvider;
use trivia_server::routes::build_router;
use trivia_server::shared::AppState;
use trivia_server::websockets::InMemoryConnectionManager;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivia_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting trivia server");

    let config = AppConfig::from_env();

    let provider = match OpenTdbQuestionProvider::new(config.provider_url.clone(), config.provider_timeout) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!(error = %e, "Failed to build question provider client");
            return;
        }
    };

    let app_state = AppState::in_memory(
        &config,
        provider,
        Arc::new(InMemoryConnectionManager::new()),
    );

    let app = build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind_addr = %config.bind_addr, error = %e, "Failed to bind");
            return;
        }
    };
    info!("Server running on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped with error");
    }
}
