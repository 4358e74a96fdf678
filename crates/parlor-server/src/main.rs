use tracing_subscriber::EnvFilter;

use parlor_server::config::ServerConfig;
use parlor_server::{build_app, spawn_cache_flushers, spawn_room_sweeper};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load();
    let listen_addr = config.listen_addr.clone();

    let (app, state) = build_app(config);
    spawn_cache_flushers(state.clone());
    spawn_room_sweeper(state.clone());

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {listen_addr}: {e}"));

    tracing::info!("parlor server listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.shutdown.clone()))
        .await
        .expect("Server error");
}

async fn shutdown_signal(token: tokio_util::sync::CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    token.cancel();
}
