pub mod disk;
pub mod memory;

// Re-export the concrete stores for cleaner imports
pub use disk::DiskQuoteStore;
pub use memory::MemoryQuoteStore;
