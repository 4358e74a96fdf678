pub mod api;
pub mod authorizer;
pub mod chat_history;
pub mod config;
pub mod error;
pub mod hub;
pub mod room;
pub mod room_manager;
pub mod state;
pub mod store;
pub mod ws;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::http::header::{CONTENT_TYPE, HeaderName};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use authorizer::Authorizer;
use chat_history::ChatHistory;
use config::ServerConfig;
use hub::{Action, Hub};
use state::AppState;

/// Build the Axum router and application state, and spawn the hub worker
/// that owns all session/room/game state. Must run inside a runtime.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let config = Arc::new(config);
    let auth = Arc::new(
        Authorizer::open(&config.data.users_db, &config.data.icon_dir)
            .expect("user database must open"),
    );
    let chat =
        Arc::new(ChatHistory::open(&config.data.chat_db).expect("chat database must open"));

    let (actions_tx, actions_rx) = mpsc::unbounded_channel();
    let state = AppState {
        auth: Arc::clone(&auth),
        chat: Arc::clone(&chat),
        actions: actions_tx.clone(),
        config: Arc::clone(&config),
        next_socket_id: Arc::new(AtomicU64::new(1)),
        shutdown: CancellationToken::new(),
    };

    tokio::spawn(Hub::new(auth, chat, actions_tx).run(actions_rx));

    // The browser clients live on another origin and send cookies, so the
    // CORS layer mirrors whatever Origin arrives.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-requested-with")]);

    let app = Router::new()
        .route("/ws", axum::routing::get(ws::ws_handler))
        .route("/register", axum::routing::post(api::register))
        .route("/login", axum::routing::post(api::login))
        .route("/logout", axum::routing::get(api::logout))
        .route("/upload-icon", axum::routing::post(api::upload_icon))
        .route("/icon", axum::routing::get(api::icon))
        .route("/set-name", axum::routing::post(api::set_name))
        .route("/set-slogan", axum::routing::post(api::set_slogan))
        .route("/friend-request", axum::routing::post(api::friend_request))
        .route("/friend-accept", axum::routing::post(api::friend_accept))
        .route("/friend-reject", axum::routing::post(api::friend_reject))
        .route("/friend-requests", axum::routing::get(api::friend_requests))
        .route("/friend-list", axum::routing::get(api::friend_list))
        .route("/chat-history", axum::routing::get(api::chat_history))
        .route("/peer-chat-history", axum::routing::get(api::peer_chat_history))
        .route("/user-info", axum::routing::get(api::user_info))
        .fallback_service(ServeDir::new(&config.web_root))
        .layer(cors)
        .with_state(state.clone());

    (app, state)
}

/// Background task that flushes the unread and chat caches on the
/// configured cadence.
pub fn spawn_cache_flushers(state: AppState) {
    let interval_secs = state.config.caches.flush_interval_secs;
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Cache flusher shutting down, final flush");
                    flush_caches(&state);
                    break;
                }
                _ = interval.tick() => flush_caches(&state),
            }
        }
    });
}

fn flush_caches(state: &AppState) {
    match state.auth.flush_unread_now() {
        Ok(applied) if applied > 0 => tracing::info!(applied, "Unread cache flushed"),
        Ok(_) => {},
        Err(e) => tracing::error!(error = %e, "Unread cache flush failed"),
    }
    match state.chat.flush_now() {
        Ok(flushed) if flushed > 0 => tracing::info!(flushed, "Chat cache flushed"),
        Ok(_) => {},
        Err(e) => tracing::error!(error = %e, "Chat cache flush failed"),
    }
}

/// Background task that posts the empty-room sweep into the action queue,
/// keeping room mutation on the single worker.
pub fn spawn_room_sweeper(state: AppState) {
    let interval_secs = state.config.rooms.sweep_interval_secs;
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Room sweeper shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if state.actions.send(Action::SweepRooms).is_err() {
                        break;
                    }
                }
            }
        }
    });
}
