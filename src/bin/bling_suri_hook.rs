use anyhow::{Context, Result};
use bling_suri_hook::app::AppEnv;
use bling_suri_hook::config::Config;
use bling_suri_hook::http::router;
use tokio::signal;
use tracing_subscriber::{
    EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cnf = Config::load()?;
    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cnf.log_level.as_directive()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE))
        .init();

    if cnf.suri_api_url.is_none() || cnf.suri_api_token.is_none() {
        tracing::warn!("SURI_API_URL or SURI_API_TOKEN is not set, webhooks will fail until configured");
    }
    tracing::info!("target schema: {:?}", cnf.suri_schema);

    let socket_addr = format!("{}:{}", cnf.app_host, cnf.app_port);
    let app = AppEnv::from_config(cnf)?;
    let router = router::new(app);

    tracing::info!("starting axum server on {socket_addr}");
    let listener = tokio::net::TcpListener::bind(&socket_addr)
        .await
        .with_context(|| format!("failed to bind {socket_addr}"))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let ctrl_c = async {
                signal::ctrl_c()
                    .await
                    .expect("failed to install C-c handler");
            };

            let sigterm = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("failed to install sigterm handler")
                    .recv()
                    .await
            };

            tokio::select! {
                _ = ctrl_c => {
                tracing::info!("ctrl-c hit, graceful shutdown...")
                },
                _ = sigterm => {
                tracing::info!("SIGTERM received, graceful shutdown...")
                },
            };
        })
        .await
        .context("axum server failed")?;
    tracing::info!("process terminated");
    Ok(())
}
