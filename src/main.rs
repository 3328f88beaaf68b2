use std::net::SocketAddr;
use std::sync::Arc;

use squadlink::common::logger;
use squadlink::configs::Config;
use squadlink::engine::sweep;
use squadlink::platform::InMemoryPlatform;
use squadlink::rest;
use squadlink::server::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Could not load config ({}), using defaults", e);
        Config::default()
    });
    logger::init(&config);

    // The in-memory platform stands in until a gateway adapter is wired in.
    let platform = Arc::new(InMemoryPlatform::new());
    let shared_state = Arc::new(AppState::new(
        config.clone(),
        platform.clone(),
        platform.clone(),
    ));

    let sweeper = sweep::spawn(shared_state.clone());

    let app = rest::router()
        .with_state(shared_state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("LFG session server listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    sweeper.abort();
    Ok(())
}
