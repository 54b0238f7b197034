use axum::Json;
use axum::response::{IntoResponse, Response};
use reqwest::StatusCode;
use thiserror::Error as ThisError;

use crate::model::WebhookReply;

/// Failures inside the sync pipeline that stop a request from being processed.
#[derive(ThisError, Debug)]
pub enum SyncError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("invalid xml: {0}")]
    Xml(String),
    #[error("misconfigured: {0}")]
    Misconfigured(String),
    #[error("webhook signature rejected: {0}")]
    InvalidSignature(String),
}

impl SyncError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SyncError::MalformedBody(_) | SyncError::Xml(_) | SyncError::InvalidSignature(_)
        )
    }
}

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("{0}")]
    Sync(#[from] SyncError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Sync(SyncError::InvalidSignature(_)) => StatusCode::UNAUTHORIZED,
            AppError::Sync(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("error while handling webhook: {self:?}");
        let reply = WebhookReply {
            ok: false,
            error: Some(self.to_string()),
            ..Default::default()
        };
        (self.status(), Json(reply)).into_response()
    }
}
