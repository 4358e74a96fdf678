use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// HTTP-surface failures. The realtime path never uses this; rule-engine
/// rejections are silently dropped there.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    #[allow(dead_code)]
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Internal(m) => write!(f, "{m}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, message).into_response()
    }
}
