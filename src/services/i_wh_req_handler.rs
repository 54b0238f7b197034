use crate::model::error::SyncError;
use crate::model::{InboundEnvelope, WebhookOutcome};

pub trait IWebhookRequestHandleService: Send + Sync + 'static {
    fn handle_webhook_request(
        &self,
        request: InboundEnvelope,
    ) -> impl Future<Output = Result<WebhookOutcome, SyncError>> + Send;
}
