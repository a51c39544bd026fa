use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde_json::json;
use thiserror::Error;

pub const MISSING_IMAGES: &str = "Please upload both person and cloth images";
pub const GENERIC_FAILURE: &str = "An error occurred during processing";

#[derive(Debug, Error)]
pub enum TryOnError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),
    #[error("A try-on request is already in progress")]
    Busy,
    /// Non-2xx from the remote service; `message` is what the user sees.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// No usable response. The cause is for logs, the user sees the generic text.
    #[error("An error occurred during processing")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("preferences io: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preferences task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

fn detail(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

impl IntoResponse for TryOnError {
    fn into_response(self) -> Response {
        let status = match &self {
            TryOnError::Validation(_) => StatusCode::BAD_REQUEST,
            TryOnError::Busy => StatusCode::CONFLICT,
            // client errors from upstream are the caller's to fix, pass them through
            TryOnError::Server { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            TryOnError::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        detail(status, self.to_string())
    }
}

impl IntoResponse for PreferencesError {
    fn into_response(self) -> Response {
        tracing::error!("❌ {}", self);
        detail(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

impl IntoResponse for UnknownOption {
    fn into_response(self) -> Response {
        detail(StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
    }
}
