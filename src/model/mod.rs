use std::collections::HashMap;

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;
pub mod product;

pub use product::{CanonicalProduct, SchemaVersion, SuriProduct};

/// One inbound webhook request, detached from the HTTP framework.
#[derive(Debug, Clone)]
pub struct InboundEnvelope {
    pub method: http::Method,
    pub headers: http::HeaderMap,
    pub queries: HashMap<String, String>,
    pub base64_encoded: bool,
    /// Raw body bytes as received, before any transport or charset decoding.
    pub body: Bytes,
}

impl InboundEnvelope {
    pub fn content_type(&self) -> &str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|h| h.to_str().ok())
    }

    pub fn query_flag(&self, name: &str) -> bool {
        self.queries
            .get(name)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    Xml,
    Json,
    Text,
}

/// Decoded request body. `parsed` is a tree for xml/json and a plain string for text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody {
    pub format: BodyFormat,
    pub parsed: Value,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Updated,
    CreateFailed,
    UpdateFailed,
    NetworkError,
    Deleted,
    DeleteFailed,
    NotImplemented,
}

/// Result of reconciling one product with the Suri API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub ok: bool,
    pub action: SyncAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn success(action: SyncAction, status: u16) -> Self {
        Self {
            ok: true,
            action,
            status: Some(status),
            body: None,
            error: None,
        }
    }

    pub fn http_failure(action: SyncAction, status: u16, body: String) -> Self {
        Self {
            ok: false,
            action,
            status: Some(status),
            body: Some(body),
            error: None,
        }
    }

    pub fn network_error(err: impl ToString) -> Self {
        Self {
            ok: false,
            action: SyncAction::NetworkError,
            status: None,
            body: None,
            error: Some(err.to_string()),
        }
    }

    pub fn not_implemented() -> Self {
        Self {
            ok: false,
            action: SyncAction::NotImplemented,
            status: None,
            body: None,
            error: Some("delete is not implemented for this target schema".to_string()),
        }
    }

    pub fn details(&self) -> Option<&str> {
        self.body.as_deref().or(self.error.as_deref())
    }
}

/// Why a request was acknowledged without touching the Suri API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ProductNotFound,
    MissingSku,
}

impl SkipReason {
    pub fn message(self) -> &'static str {
        match self {
            SkipReason::ProductNotFound => "product not found in payload",
            SkipReason::MissingSku => "product has no sku",
        }
    }
}

/// What the service did with one webhook request.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    MethodNotAllowed,
    Skipped(SkipReason),
    Synced { sku: String, outcome: SyncOutcome },
}

/// JSON body returned to the webhook sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<SyncAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
