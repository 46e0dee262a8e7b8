//! Quote provider backed by the AwesomeAPI economia endpoint.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::deadline::Deadline;
use crate::core::error::FetchError;
use crate::core::quote::{CurrencyPair, ExchangeRateProvider, Quote};

/// Client for the provider's `last` quote endpoint.
///
/// Every fetch runs as its own task, raced against a deadline derived from
/// the caller's. A fetch that loses the race is aborted, not abandoned.
pub struct AwesomeApiProvider {
    url: String,
    pair: CurrencyPair,
    budget: Duration,
    client: reqwest::Client,
}

impl AwesomeApiProvider {
    pub fn new(
        base_url: &str,
        pair: CurrencyPair,
        budget: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cambio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(AwesomeApiProvider {
            url: format!("{}/json/last/{}", base_url, pair.segment()),
            pair,
            budget,
            client,
        })
    }
}

/// Aborts the wrapped call task when dropped, so a fetch abandoned by its
/// deadline or by a disconnecting caller cannot keep running.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn execute(
    request: reqwest::RequestBuilder,
    pair: &CurrencyPair,
) -> Result<Quote, FetchError> {
    let response = request.send().await?.error_for_status()?;
    // Take the body as bytes first: a failure past this point is a decode
    // problem, never a transport one.
    let body = response.bytes().await?;
    decode_envelope(&body, pair)
}

/// Decode the provider's wrapper envelope, a map keyed by pair code.
fn decode_envelope(body: &[u8], pair: &CurrencyPair) -> Result<Quote, FetchError> {
    let mut envelope: HashMap<String, Quote> = serde_json::from_slice(body)?;
    envelope
        .remove(&pair.code())
        .ok_or_else(|| FetchError::MissingPair(pair.code()))
}

#[async_trait]
impl ExchangeRateProvider for AwesomeApiProvider {
    async fn fetch(&self, parent: Deadline) -> Result<Quote, FetchError> {
        let deadline = parent.bounded(self.budget);
        debug!(url = %self.url, remaining = ?deadline.remaining(), "Requesting quote");

        let request = self.client.get(&self.url);
        let pair = self.pair.clone();
        let (tx, rx) = oneshot::channel();
        let call = tokio::spawn(async move {
            // The receiver may have given up already; the result is then
            // dropped with the slot, never blocking this task.
            let _ = tx.send(execute(request, &pair).await);
        });
        let _call = AbortOnDrop(call);

        tokio::select! {
            outcome = rx => match outcome {
                Ok(result) => result,
                // Sender gone without a result: the call task was torn down.
                Err(_) => Err(FetchError::Cancelled),
            },
            () = deadline.expired() => {
                warn!(pair = %self.pair, "Provider deadline expired, abandoning call");
                Err(FetchError::Cancelled)
            }
        }
    }
}
