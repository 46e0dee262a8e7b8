pub mod awesome_api;

// Re-export the concrete provider for cleaner imports
pub use awesome_api::AwesomeApiProvider;
