use std::sync::Arc;

use crate::config::Config;
use crate::services::i_wh_req_handler::IWebhookRequestHandleService;
use crate::services::wh_req_handler::ProductServiceImpl;

#[derive(Debug, Clone)]
pub struct AppEnv<ProductService: IWebhookRequestHandleService + Clone = ProductServiceImpl> {
    pub cnf: Arc<Config>,
    pub request_handle_svc: ProductService,
}

impl<ProductService> AppEnv<ProductService>
where
    ProductService: IWebhookRequestHandleService + Clone,
{
    pub fn new(cnf: Arc<Config>, request_handle_svc: ProductService) -> Self {
        Self {
            cnf,
            request_handle_svc,
        }
    }
}

impl AppEnv<ProductServiceImpl> {
    /// Wires the production service from a loaded config.
    pub fn from_config(cnf: Config) -> anyhow::Result<Self> {
        let cnf = Arc::new(cnf);
        let client = reqwest::ClientBuilder::new()
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .build()?;
        let svc = ProductServiceImpl::new(cnf.clone(), client);
        Ok(Self::new(cnf, svc))
    }
}
