use http::StatusCode;
use reqwest::{Method, Url};

use crate::config::Config;
use crate::model::error::SyncError;
use crate::model::{SchemaVersion, SuriProduct, SyncAction, SyncOutcome};

/// Endpoint and credentials for the Suri API, validated from [`Config`].
#[derive(Debug, Clone)]
pub struct SuriTarget {
    base_url: Url,
    token: String,
}

impl SuriTarget {
    pub fn from_config(cnf: &Config) -> Result<Self, SyncError> {
        let (Some(url), Some(token)) = (cnf.suri_api_url.as_deref(), cnf.suri_api_token.as_deref())
        else {
            return Err(SyncError::Misconfigured(
                "SURI_API_URL and SURI_API_TOKEN must be set".to_string(),
            ));
        };
        let base_url = Url::parse(url)
            .map_err(|e| SyncError::Misconfigured(format!("SURI_API_URL {url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Misconfigured(format!(
                "SURI_API_URL {url:?} cannot be a base url"
            )));
        }
        Ok(Self {
            base_url,
            token: token.to_string(),
        })
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// One write attempt: verb, path, and the action it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WriteCall {
    method: Method,
    collection: &'static str,
    keyed: bool,
    success: SyncAction,
    failure: SyncAction,
}

impl WriteCall {
    const UPDATE_PRODUCTS: WriteCall = WriteCall {
        method: Method::PUT,
        collection: "products",
        keyed: true,
        success: SyncAction::Updated,
        failure: SyncAction::UpdateFailed,
    };
    const CREATE_PRODUCTS: WriteCall = WriteCall {
        method: Method::POST,
        collection: "products",
        keyed: false,
        success: SyncAction::Created,
        failure: SyncAction::CreateFailed,
    };
    const CREATE_PRODUCT: WriteCall = WriteCall {
        method: Method::POST,
        collection: "product",
        keyed: false,
        success: SyncAction::Created,
        failure: SyncAction::CreateFailed,
    };

    fn url(&self, target: &SuriTarget, sku: &str) -> Url {
        if self.keyed {
            target.endpoint(&[self.collection, sku])
        } else {
            target.endpoint(&[self.collection])
        }
    }
}

/// Primary write, its complementary write, and the statuses that trigger the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WriteStrategy {
    primary: WriteCall,
    fallback: WriteCall,
    fallback_on: &'static [StatusCode],
}

impl WriteStrategy {
    fn for_schema(schema: SchemaVersion) -> Self {
        match schema {
            SchemaVersion::Flat => WriteStrategy {
                primary: WriteCall::UPDATE_PRODUCTS,
                fallback: WriteCall::CREATE_PRODUCTS,
                fallback_on: &[StatusCode::NOT_FOUND, StatusCode::BAD_REQUEST],
            },
            SchemaVersion::Variants => WriteStrategy {
                primary: WriteCall::CREATE_PRODUCT,
                fallback: WriteCall::UPDATE_PRODUCTS,
                fallback_on: &[StatusCode::CONFLICT, StatusCode::BAD_REQUEST],
            },
        }
    }
}

enum Attempt {
    Succeeded(StatusCode),
    Failed(StatusCode, String),
}

#[derive(Debug, Clone)]
pub struct SuriClient {
    client: reqwest::Client,
}

impl SuriClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        target: &SuriTarget,
        method: Method,
        url: Url,
        body: Option<&SuriProduct>,
    ) -> Result<Attempt, reqwest::Error> {
        let mut req = self
            .client
            .request(method, url)
            .bearer_auth(&target.token);
        if let Some(product) = body {
            req = req.json(product);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(Attempt::Succeeded(status));
        }
        let text = resp.text().await?;
        Ok(Attempt::Failed(status, text))
    }

    /// Writes `product` and falls back once to the complementary verb when the
    /// primary write reports a missing or conflicting resource.
    #[tracing::instrument(level = "debug", skip(self, target, product))]
    pub async fn upsert(&self, target: &SuriTarget, sku: &str, product: &SuriProduct) -> SyncOutcome {
        let strategy = WriteStrategy::for_schema(product.schema());
        match self.try_upsert(target, sku, product, strategy).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("network error talking to suri: {e}");
                SyncOutcome::network_error(e)
            }
        }
    }

    async fn try_upsert(
        &self,
        target: &SuriTarget,
        sku: &str,
        product: &SuriProduct,
        strategy: WriteStrategy,
    ) -> Result<SyncOutcome, reqwest::Error> {
        let primary = &strategy.primary;
        tracing::info!("writing product sku={sku} via {}", primary.method);
        let status = match self
            .send(target, primary.method.clone(), primary.url(target, sku), Some(product))
            .await?
        {
            Attempt::Succeeded(status) => {
                tracing::info!("product sku={sku} {:?}", primary.success);
                return Ok(SyncOutcome::success(primary.success, status.as_u16()));
            }
            Attempt::Failed(status, _) if strategy.fallback_on.contains(&status) => status,
            Attempt::Failed(status, text) => {
                tracing::error!("{} failed for sku={sku}: {status} - {text}", primary.method);
                return Ok(SyncOutcome::http_failure(primary.failure, status.as_u16(), text));
            }
        };

        let fallback = &strategy.fallback;
        tracing::info!(
            "{} answered {status} for sku={sku}, retrying via {}",
            primary.method,
            fallback.method
        );
        match self
            .send(target, fallback.method.clone(), fallback.url(target, sku), Some(product))
            .await?
        {
            Attempt::Succeeded(status) => {
                tracing::info!("product sku={sku} {:?}", fallback.success);
                Ok(SyncOutcome::success(fallback.success, status.as_u16()))
            }
            Attempt::Failed(status, text) => {
                tracing::error!("{} failed for sku={sku}: {status} - {text}", fallback.method);
                Ok(SyncOutcome::http_failure(fallback.failure, status.as_u16(), text))
            }
        }
    }

    /// Deletes the product keyed by sku. Only the flat contract exposes a delete route.
    #[tracing::instrument(level = "debug", skip(self, target))]
    pub async fn delete(&self, target: &SuriTarget, schema: SchemaVersion, sku: &str) -> SyncOutcome {
        if schema == SchemaVersion::Variants {
            tracing::warn!("delete requested for sku={sku} but the variants contract has no delete route");
            return SyncOutcome::not_implemented();
        }
        tracing::info!("deleting product sku={sku}");
        let url = target.endpoint(&["products", sku]);
        match self.send(target, Method::DELETE, url, None).await {
            Ok(Attempt::Succeeded(status)) => {
                tracing::info!("product sku={sku} deleted, status {status}");
                SyncOutcome::success(SyncAction::Deleted, status.as_u16())
            }
            Ok(Attempt::Failed(status, text)) => {
                tracing::error!("delete failed for sku={sku}: {status} - {text}");
                SyncOutcome::http_failure(SyncAction::DeleteFailed, status.as_u16(), text)
            }
            Err(e) => {
                tracing::error!("network error deleting sku={sku}: {e}");
                SyncOutcome::network_error(e)
            }
        }
    }
}
