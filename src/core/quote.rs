//! Exchange-rate quote model and the provider-facing trait.

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::deadline::Deadline;
use crate::core::error::FetchError;

/// A currency pair such as USD/BRL, in provider notation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Self {
        CurrencyPair {
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }

    /// Envelope key used by the provider, e.g. `USDBRL`.
    pub fn code(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// URL path segment used by the provider, e.g. `USD-BRL`.
    pub fn segment(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

/// One exchange-rate snapshot, exactly as the provider reported it.
///
/// Numeric-looking fields stay text on purpose: the service guarantees that
/// the provider's textual values survive decode and re-encode byte for byte,
/// with no float round-trip in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Fetch the current quote, giving up with [`FetchError::Cancelled`] once
    /// the deadline derived from `parent` fires.
    async fn fetch(&self, parent: Deadline) -> Result<Quote, FetchError>;
}
