use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use refresh_common::{Config, RunStatus, StatusWriter};
use store_client::StoreClient;
use textproxy_client::TextProxyClient;

use refresh_pipeline::{
    build_searcher, ContentExtractor, LlmRewriter, Runner, RunnerOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("refresh_pipeline=info".parse()?))
        .init();

    info!("Article refresh pipeline starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let status_writer = StatusWriter::new(&config.status_file);

    // The rewrite credential is the one fatal precondition; report it
    // through the status file before touching the network.
    let rewriter = match LlmRewriter::from_config(&config) {
        Ok(rewriter) => rewriter,
        Err(e) => {
            error!(error = %e, "Configuration error");
            let mut status = RunStatus::begin(0);
            status.finish_error(format!("{e:#}"));
            if let Err(write_err) = status_writer.write(&status) {
                error!(error = %write_err, "Failed to write status file");
            }
            return Err(e);
        }
    };

    let proxy = Arc::new(TextProxyClient::new(
        &config.text_proxy_base_url,
        config.request_timeout,
    ));

    let store = StoreClient::new(&config.api_base_url, config.request_timeout);
    let searcher = build_searcher(&config, proxy.clone());
    let extractor = ContentExtractor::new(config.request_timeout, proxy.clone());

    let options = RunnerOptions {
        max_originals: config.max_originals,
        max_candidates: config.max_candidates,
        skip_if_updated: config.skip_if_updated,
        pace_delay: config.pace_delay,
        origin_host: config.origin_host.clone(),
        proxy_host: Some(proxy.host().to_string()),
    };

    let runner = Runner::new(
        Box::new(store),
        searcher,
        extractor,
        Box::new(rewriter),
        status_writer,
        options,
    );

    let stats = runner.run().await?;
    info!("{stats}");

    Ok(())
}
