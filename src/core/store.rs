//! Durable quote storage abstractions; implementations live in `store/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::deadline::Deadline;
use crate::core::error::StoreError;
use crate::core::quote::Quote;

/// A quote plus the identity the store assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuote {
    pub id: u64,
    pub stored_at: DateTime<Utc>,
    #[serde(flatten)]
    pub quote: Quote,
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persist one quote under the store's own write deadline, derived from
    /// `parent`. Content fields are stored as received; only identity
    /// metadata is added.
    async fn insert(&self, parent: Deadline, quote: Quote) -> Result<StoredQuote, StoreError>;
}
