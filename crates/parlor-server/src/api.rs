//! The thin HTTP surface: registration, login, profile, friends and chat
//! history. Responses are the textual result codes the clients switch on;
//! session state rides in cookies.

use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_TYPE, HeaderMap, SET_COOKIE};
use axum::response::{AppendHeaders, IntoResponse, Json, Response};
use serde::Deserialize;

use crate::authorizer::AuthError;
use crate::chat_history::ChatHistory;
use crate::error::AppError;
use crate::state::AppState;

const COOKIE_MAX_AGE: u32 = 1_296_000;

/// Pull the numeric `sessdata` cookie out of the Cookie header.
fn sessdata_from_cookies(headers: &HeaderMap) -> Option<u32> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for part in cookies.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("sessdata=") {
            return value.parse().ok();
        }
    }
    None
}

/// Resolve the calling session, or the `PLEASE_LOG_IN` reply.
fn require_session(state: &AppState, headers: &HeaderMap) -> Result<(i64, String), Response> {
    let sessdata = sessdata_from_cookies(headers).unwrap_or(0);
    state
        .auth
        .authorize(sessdata)
        .map_err(|_| "PLEASE_LOG_IN".into_response())
}

fn session_cookies(
    sessdata: u32,
    user_name: &str,
    id: i64,
) -> AppendHeaders<[(axum::http::HeaderName, String); 3]> {
    AppendHeaders([
        (SET_COOKIE, format!("sessdata={sessdata}; Max-Age={COOKIE_MAX_AGE}")),
        (
            SET_COOKIE,
            format!("user_name={user_name}; Max-Age={COOKIE_MAX_AGE}"),
        ),
        (SET_COOKIE, format!("id={id}; Max-Age={COOKIE_MAX_AGE}")),
    ])
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub user_name: String,
    pub password: String,
}

/// POST /register
pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> String {
    match state.auth.register(&body.user_name, &body.password) {
        Ok(()) => "SUCCESS".to_string(),
        Err(e) => e.to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub user_name: Option<String>,
    pub id: Option<i64>,
    pub password: String,
}

/// POST /login — by name or by numeric id.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    let outcome = if let Some(ref user_name) = body.user_name {
        state
            .auth
            .log_in_by_name(user_name, &body.password)
            .map(|(id, sessdata)| (id, user_name.clone(), sessdata))
    } else if let Some(id) = body.id {
        state
            .auth
            .log_in_by_id(id, &body.password)
            .map(|(user_name, sessdata)| (id, user_name, sessdata))
    } else {
        Err(AuthError::UserDoesNotExist)
    };

    match outcome {
        Ok((id, user_name, sessdata)) => (
            session_cookies(sessdata, &user_name, id),
            "SUCCESS".to_string(),
        )
            .into_response(),
        Err(e) => e.to_string().into_response(),
    }
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> String {
    let sessdata = sessdata_from_cookies(&headers).unwrap_or(0);
    match state.auth.log_out(sessdata) {
        Ok(()) => "Successfully logged out.".to_string(),
        Err(_) => "Failed to log out.".to_string(),
    }
}

/// POST /upload-icon — multipart PNG stored under the user's id.
pub async fn upload_icon(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };

    let bytes = match multipart.next_field().await {
        Ok(Some(field)) => match field.bytes().await {
            Ok(bytes) => bytes,
            Err(_) => return "SET_ICON_FAILED".into_response(),
        },
        _ => return "SET_ICON_FAILED".into_response(),
    };

    match state.auth.set_icon(id, &bytes) {
        Ok(()) => "SUCCESS".into_response(),
        Err(e) => e.to_string().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct IconQuery {
    pub id: Option<i64>,
    pub user_name: Option<String>,
}

/// GET /icon?id= or /icon?user_name=
pub async fn icon(
    State(state): State<AppState>,
    Query(query): Query<IconQuery>,
) -> Result<Response, AppError> {
    let id = match (query.id, query.user_name) {
        (Some(id), _) => id,
        (None, Some(ref name)) => state
            .auth
            .user_id_by_name(name)
            .map_err(|e| AppError::NotFound(e.to_string()))?,
        (None, None) => return Err(AppError::BadRequest("id or user_name required".into())),
    };

    match tokio::fs::read(state.auth.icon_path(id)).await {
        Ok(bytes) => Ok(([(CONTENT_TYPE, "image/png")], bytes).into_response()),
        Err(_) => Err(AppError::NotFound("no icon".into())),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetNameBody {
    pub user_name: String,
}

/// POST /set-name
pub async fn set_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SetNameBody>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.set_user_name(id, &body.user_name) {
        Ok(()) => {
            let cookie = AppendHeaders([(
                SET_COOKIE,
                format!("user_name={}; Max-Age={COOKIE_MAX_AGE}", body.user_name),
            )]);
            (cookie, "SUCCESS".to_string()).into_response()
        },
        Err(e) => e.to_string().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetSloganBody {
    pub slogan: String,
}

/// POST /set-slogan
pub async fn set_slogan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SetSloganBody>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.set_slogan(id, &body.slogan) {
        Ok(()) => "SUCCESS".into_response(),
        Err(e) => e.to_string().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub requestee_id: i64,
}

/// POST /friend-request
pub async fn friend_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FriendRequestBody>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.friend_request(id, body.requestee_id) {
        Ok(()) => "SUCCESS".into_response(),
        Err(e) => e.to_string().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct FriendAnswerBody {
    pub requester_id: i64,
}

/// POST /friend-accept
pub async fn friend_accept(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FriendAnswerBody>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.accept_friend_request(id, body.requester_id) {
        Ok(()) => "SUCCESS".into_response(),
        Err(_) => "FAILED".into_response(),
    }
}

/// POST /friend-reject
pub async fn friend_reject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FriendAnswerBody>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.reject_friend_request(id, body.requester_id) {
        Ok(()) => "SUCCESS".into_response(),
        Err(_) => "FAILED".into_response(),
    }
}

/// GET /friend-requests
pub async fn friend_requests(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.friend_requests(id) {
        Ok(requests) => Json(requests).into_response(),
        Err(e) => e.to_string().into_response(),
    }
}

/// GET /friend-list — unread counters include the cached deltas.
pub async fn friend_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    match state.auth.friend_list(id) {
        Ok(friends) => Json(friends).into_response(),
        Err(e) => e.to_string().into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatHistoryQuery {
    pub latest_timestamp: Option<i64>,
}

/// GET /chat-history?latest_timestamp= — 20 newest per peer, merged with
/// the unflushed cache.
pub async fn chat_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ChatHistoryQuery>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    let before = query
        .latest_timestamp
        .unwrap_or_else(|| ChatHistory::timestamp_now() + 1);
    match state.chat.get_chat_message(id, before) {
        Ok(history) => Json(history).into_response(),
        Err(e) => {
            tracing::warn!(user_id = id, error = %e, "Chat history query failed");
            "FAILED".into_response()
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct PeerChatHistoryQuery {
    pub friend_id: i64,
    pub latest_timestamp: Option<i64>,
}

/// GET /peer-chat-history?friend_id=&latest_timestamp= — one page of a
/// single conversation.
pub async fn peer_chat_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PeerChatHistoryQuery>,
) -> Response {
    let (id, _) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    let before = query
        .latest_timestamp
        .unwrap_or_else(|| ChatHistory::timestamp_now() + 1);
    match state.chat.get_peer_messages(id, query.friend_id, before) {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            tracing::warn!(user_id = id, error = %e, "Peer chat history query failed");
            "FAILED".into_response()
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct UserInfoQuery {
    pub id: i64,
}

/// GET /user-info?id=
pub async fn user_info(
    State(state): State<AppState>,
    Query(query): Query<UserInfoQuery>,
) -> Result<Response, AppError> {
    state
        .auth
        .user_info(query.id)
        .map(|info| Json(info).into_response())
        .map_err(|e| AppError::NotFound(e.to_string()))
}
