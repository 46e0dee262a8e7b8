use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::deadline::Deadline;
use crate::core::error::StoreError;
use crate::core::quote::Quote;
use crate::core::store::{QuoteStore, StoredQuote};

/// In-memory store for tests and anywhere durability is not wanted.
pub struct MemoryQuoteStore {
    quotes: Mutex<Vec<StoredQuote>>,
    next_id: AtomicU64,
    budget: Duration,
}

impl MemoryQuoteStore {
    pub fn new(budget: Duration) -> Self {
        Self {
            quotes: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            budget,
        }
    }

    pub fn count(&self) -> usize {
        self.quotes.lock().unwrap().len()
    }

    /// Copy of everything inserted so far, in insertion order.
    pub fn snapshot(&self) -> Vec<StoredQuote> {
        self.quotes.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn insert(&self, parent: Deadline, quote: Quote) -> Result<StoredQuote, StoreError> {
        let deadline = parent.bounded(self.budget);
        if deadline.is_elapsed() {
            return Err(StoreError::DeadlineExceeded);
        }

        let record = StoredQuote {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            stored_at: Utc::now(),
            quote,
        };
        self.quotes.lock().unwrap().push(record.clone());
        Ok(record)
    }
}
