use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::authorizer::Authorizer;
use crate::chat_history::ChatHistory;
use crate::config::ServerConfig;
use crate::hub::Action;

/// Shared handles cloned into every HTTP handler and socket task. The
/// stores are constructed once in `main`; mutable hub/room/game state
/// lives solely on the worker behind the action queue.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authorizer>,
    pub chat: Arc<ChatHistory>,
    pub actions: mpsc::UnboundedSender<Action>,
    pub config: Arc<ServerConfig>,
    pub next_socket_id: Arc<AtomicU64>,
    pub shutdown: CancellationToken,
}
