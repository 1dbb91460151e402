use anyhow::{Context, Result};
use comment_summarizer::config::Config;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    comment_summarizer::setup_logging();

    // Missing secrets stop the process here, before anything is served.
    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        provider = config.ai.provider.as_str(),
        model = %config.ai.model,
        comment_limit = config.comment_limit,
        "configuration loaded"
    );

    let app = comment_summarizer::app(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT")?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
