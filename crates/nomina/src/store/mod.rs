//! Storage seams shared by the workflows.
//!
//! Each workflow declares the narrow repository traits it consumes. The in-memory
//! store implements all of them over a single lock so compare-and-swap writes stay
//! atomic without a database.

mod memory;

pub use memory::InMemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record changed concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
