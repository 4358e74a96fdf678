//! WebSocket endpoint: every socket event is wrapped as an [`Action`] and
//! appended to the hub's queue; a writer task drains the socket's
//! outbound channel so the worker never blocks on a slow client.

use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::hub::{Action, SocketId};
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let socket_id = state.next_socket_id.fetch_add(1, Ordering::Relaxed);
    let (ws_sender, ws_receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    if state
        .actions
        .send(Action::Open {
            socket: socket_id,
            sender: tx,
        })
        .is_err()
    {
        return;
    }
    spawn_writer(ws_sender, rx);

    read_loop(ws_receiver, &state, socket_id).await;

    let _ = state.actions.send(Action::Close { socket: socket_id });
    tracing::debug!(socket = socket_id, "Socket closed");
}

fn spawn_writer(mut ws_sender: SplitSink<WebSocket, Message>, mut rx: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });
}

async fn read_loop(mut ws_receiver: SplitStream<WebSocket>, state: &AppState, socket_id: SocketId) {
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                if state
                    .actions
                    .send(Action::Frame {
                        socket: socket_id,
                        payload: text.to_string(),
                    })
                    .is_err()
                {
                    break;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        }
    }
}
