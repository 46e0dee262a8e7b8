use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::deadline::Deadline;

/// The one field the client cares about from the service response.
#[derive(Debug, Deserialize)]
struct CurrentQuote {
    bid: String,
}

/// Ask a running quote service for the current rate and write it to the
/// configured sink file, replacing any previous content. The whole exchange
/// runs under the client deadline; any failure exits non-zero without
/// touching the sink.
pub async fn run(config: &AppConfig) -> Result<()> {
    let deadline = Deadline::after(config.client.timeout());

    let client = reqwest::Client::builder()
        .user_agent(concat!("cambio/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(&config.client.endpoint)
        .timeout(deadline.remaining())
        .send()
        .await
        .with_context(|| format!("Quote service unreachable at {}", config.client.endpoint))?
        .error_for_status()
        .context("Quote service reported a failure")?;

    let quote: CurrentQuote = response
        .json()
        .await
        .context("Malformed quote payload from service")?;

    let content = format!("Dolar: {}", quote.bid);
    tokio::fs::write(&config.client.output_path, &content)
        .await
        .with_context(|| format!("Failed to write quote to {}", config.client.output_path))?;

    info!(path = %config.client.output_path, bid = %quote.bid, "Wrote current quote");
    Ok(())
}
