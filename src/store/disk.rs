use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use tokio::task;
use tracing::debug;

use crate::core::deadline::Deadline;
use crate::core::error::StoreError;
use crate::core::quote::Quote;
use crate::core::store::{QuoteStore, StoredQuote};

const QUOTES_PARTITION: &str = "quotes";

/// fjall-backed quote store.
///
/// Records live in the `quotes` partition under big-endian ids, so iteration
/// order is insertion order and the highest key seeds the id counter on the
/// next open. The engine write runs on the blocking pool, wrapped by the
/// insert deadline.
pub struct DiskQuoteStore {
    keyspace: Keyspace,
    quotes: PartitionHandle,
    next_id: Arc<AtomicU64>,
    budget: Duration,
}

impl DiskQuoteStore {
    /// Open (or create) the store under `path`. Partition setup happens here,
    /// once at startup, never on the request path.
    pub fn open(path: &Path, budget: Duration) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let quotes = keyspace
            .open_partition(QUOTES_PARTITION, PartitionCreateOptions::default())
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Seed the id counter from whatever a previous run left behind.
        let last_id = match quotes
            .last_key_value()
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some((key, _)) => decode_id(&key)?,
            None => 0,
        };

        Ok(DiskQuoteStore {
            keyspace,
            quotes,
            next_id: Arc::new(AtomicU64::new(last_id + 1)),
            budget,
        })
    }

    /// Read one stored quote back by id.
    pub fn get(&self, id: u64) -> Result<Option<StoredQuote>, StoreError> {
        let value = self
            .quotes
            .get(id.to_be_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        value
            .map(|raw| serde_json::from_slice(&raw).map_err(StoreError::Encode))
            .transpose()
    }

    /// Number of stored quotes. Walks the partition; meant for tests and
    /// operational checks, not the request path.
    pub fn count(&self) -> Result<usize, StoreError> {
        self.quotes
            .len()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

fn decode_id(key: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| StoreError::Backend(format!("malformed quote key of {} bytes", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl QuoteStore for DiskQuoteStore {
    async fn insert(&self, parent: Deadline, quote: Quote) -> Result<StoredQuote, StoreError> {
        let deadline = parent.bounded(self.budget);
        if deadline.is_elapsed() {
            return Err(StoreError::DeadlineExceeded);
        }

        let keyspace = self.keyspace.clone();
        let quotes = self.quotes.clone();
        let next_id = Arc::clone(&self.next_id);
        let write = task::spawn_blocking(move || {
            let record = StoredQuote {
                id: next_id.fetch_add(1, Ordering::SeqCst),
                stored_at: Utc::now(),
                quote,
            };
            let value = serde_json::to_vec(&record)?;
            quotes
                .insert(record.id.to_be_bytes(), value)
                .and_then(|()| keyspace.persist(PersistMode::SyncAll))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            debug!(id = record.id, "Quote persisted");
            Ok(record)
        });

        // The deadline wraps the write. A write that loses the race keeps
        // running on the blocking pool and may still land; the caller only
        // learns that it did not land in time.
        match tokio::time::timeout_at(deadline.instant(), write).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(StoreError::Backend(join.to_string())),
            Err(_) => Err(StoreError::DeadlineExceeded),
        }
    }
}
