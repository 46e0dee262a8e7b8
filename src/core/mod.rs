//! Core business logic abstractions

pub mod config;
pub mod deadline;
pub mod error;
pub mod log;
pub mod quote;
pub mod store;

// Re-export main types for cleaner imports
pub use deadline::Deadline;
pub use error::{FetchError, StoreError};
pub use quote::{CurrencyPair, ExchangeRateProvider, Quote};
pub use store::{QuoteStore, StoredQuote};
