use crate::app::AppEnv;
use crate::model::error::AppError;
use crate::model::{InboundEnvelope, SyncAction, WebhookOutcome, WebhookReply};
use crate::services::i_wh_req_handler::IWebhookRequestHandleService;
use crate::services::wh_req_handler::ProductServiceImpl;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, Method, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;

/// Header a gateway sets when it base64-encoded the body in transit.
const TRANSFER_ENCODING_HEADER: &str = "content-transfer-encoding";

/// Turns a service outcome into the HTTP answer.
///
/// With `always_ack`, every processed request answers 200 so Bling keeps the
/// subscription enabled; failures are reported through `ok: false`.
pub fn reply_for(outcome: WebhookOutcome, always_ack: bool) -> Response {
    let (status, reply) = match outcome {
        WebhookOutcome::MethodNotAllowed => {
            return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
        }
        WebhookOutcome::Skipped(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            WebhookReply {
                ok: false,
                message: Some(reason.message().to_string()),
                ..Default::default()
            },
        ),
        WebhookOutcome::Synced { sku, outcome } => {
            let status = match (outcome.ok, outcome.action) {
                (true, _) => StatusCode::OK,
                // nothing was sent upstream
                (false, SyncAction::NotImplemented) => StatusCode::NOT_IMPLEMENTED,
                (false, _) => StatusCode::BAD_GATEWAY,
            };
            let reply = WebhookReply {
                ok: outcome.ok,
                action: Some(outcome.action),
                sku: Some(sku),
                status: outcome.status,
                details: outcome.details().map(str::to_string),
                ..Default::default()
            };
            (status, reply)
        }
    };
    let status = if always_ack { StatusCode::OK } else { status };
    (status, Json(reply)).into_response()
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn webhook_handler(
    State(app): State<Arc<AppEnv<ProductServiceImpl>>>,
    method: Method,
    headers: HeaderMap,
    Query(queries): Query<HashMap<String, String>>,
    payload: Bytes,
) -> Result<Response, AppError> {
    let base64_encoded = headers
        .get(TRANSFER_ENCODING_HEADER)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"));
    let request = InboundEnvelope {
        method,
        headers,
        queries,
        base64_encoded,
        body: payload,
    };

    let outcome = app.request_handle_svc.handle_webhook_request(request).await?;
    Ok(reply_for(outcome, app.cnf.always_ack))
}
