//! Repository collaborator backing the engine's store traits.

use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Errors raised while loading the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid seed data: {0}")]
    Invalid(String),
    #[error("Failed to hash secret: {0}")]
    Hashing(String),
}
