//! Error taxonomy for the quote pipeline.

use thiserror::Error;

/// Failure modes of one outbound quote fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider could not be reached, or answered with a non-success
    /// status.
    #[error("Quote provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The fetch deadline fired before the provider answered.
    #[error("Quote fetch cancelled by its deadline")]
    Cancelled,

    /// The response body is not a decodable quote envelope.
    #[error("Malformed quote payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The envelope decoded, but carries no entry for the requested pair.
    #[error("Provider envelope has no {0} entry")]
    MissingPair(String),
}

/// Failure modes of one quote insert.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write deadline fired before the storage engine finished.
    #[error("Quote insert cancelled by its deadline")]
    DeadlineExceeded,

    /// The storage engine rejected or lost the write.
    #[error("Storage write failed: {0}")]
    Backend(String),

    /// The record could not be serialized for storage.
    #[error("Storage encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
