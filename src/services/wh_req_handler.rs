use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::adapter::suri::{SuriClient, SuriTarget};
use crate::common::body::parse_body;
use crate::common::crypt::{self, BLING_SIGNATURE_HEADER};
use crate::common::value::{as_text, truthy_field};
use crate::config::Config;
use crate::model::error::SyncError;
use crate::model::{InboundEnvelope, SkipReason, WebhookOutcome};
use crate::services::extractor::extract_product;
use crate::services::mapper::map_bling_to_suri;

use super::i_wh_req_handler::IWebhookRequestHandleService;

static DELETE_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)delete|excluir|remover").expect("delete action pattern is valid")
});
static INACTIVE_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)inativ|exclu").expect("inactive status pattern is valid"));

/// Whether the webhook asks for the product to be removed rather than written.
pub fn wants_delete(
    envelope: &Value,
    record: &Map<String, Value>,
    request: &InboundEnvelope,
) -> bool {
    let action = envelope
        .as_object()
        .and_then(|env| {
            ["action", "evento", "event"]
                .iter()
                .find_map(|k| truthy_field(env, k))
        })
        .or_else(|| ["acao", "evento"].iter().find_map(|k| truthy_field(record, k)));
    if let Some(Value::String(action)) = action
        && DELETE_ACTION.is_match(action)
    {
        return true;
    }

    if let Some(situacao) = truthy_field(record, "situacao").and_then(as_text)
        && INACTIVE_STATUS.is_match(&situacao)
    {
        return true;
    }

    request.query_flag("delete")
}

#[derive(Debug, Clone)]
pub struct ProductServiceImpl {
    cnf: Arc<Config>,
    suri: SuriClient,
}

impl ProductServiceImpl {
    pub fn new(cnf: Arc<Config>, client: reqwest::Client) -> Self {
        Self {
            cnf,
            suri: SuriClient::new(client),
        }
    }

    fn verify_signature(&self, request: &InboundEnvelope) -> Result<(), SyncError> {
        let Some(secret) = self.cnf.bling_webhook_secret.as_deref() else {
            return Ok(());
        };
        let signature = request.header(BLING_SIGNATURE_HEADER).ok_or_else(|| {
            SyncError::InvalidSignature(format!("missing {BLING_SIGNATURE_HEADER} header"))
        })?;
        crypt::hmac_256_verify(secret.as_bytes(), &request.body, signature)?;
        tracing::debug!("hmac verified");
        Ok(())
    }
}

impl IWebhookRequestHandleService for ProductServiceImpl {
    #[tracing::instrument(level = "debug", skip_all, fields(method = %request.method))]
    async fn handle_webhook_request(
        &self,
        request: InboundEnvelope,
    ) -> Result<WebhookOutcome, SyncError> {
        if request.method != http::Method::POST {
            return Ok(WebhookOutcome::MethodNotAllowed);
        }
        tracing::info!("bling webhook received");
        tracing::debug!("headers: {:?}", request.headers);

        self.verify_signature(&request)?;

        let body = parse_body(&request)?;
        tracing::info!("payload format: {:?}", body.format);
        tracing::debug!("parsed payload: {}", body.parsed);

        let Some(record) = extract_product(&body.parsed) else {
            tracing::warn!("could not extract a product from the payload");
            tracing::debug!("payload received: {}", body.raw);
            return Ok(WebhookOutcome::Skipped(SkipReason::ProductNotFound));
        };
        tracing::info!("product extracted from bling payload");

        let mapped = map_bling_to_suri(record, &self.cnf);
        let Some(sku) = mapped.sku().map(str::to_string) else {
            tracing::warn!("product has no sku");
            return Ok(WebhookOutcome::Skipped(SkipReason::MissingSku));
        };

        let target = SuriTarget::from_config(&self.cnf)?;
        let outcome = if wants_delete(&body.parsed, record, &request) {
            tracing::info!("delete requested for sku={sku}");
            self.suri.delete(&target, mapped.schema(), &sku).await
        } else {
            tracing::info!("processing upsert for sku={sku}");
            self.suri.upsert(&target, &sku, &mapped).await
        };
        Ok(WebhookOutcome::Synced { sku, outcome })
    }
}
