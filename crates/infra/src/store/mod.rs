//! Transactional storage for the workspace graph.
//!
//! The core relies on three storage guarantees:
//! - unique `(user, entity)` memberships
//! - all-or-nothing writes, including cascading deletes
//! - consistent read snapshots
//!
//! Authorization runs *inside* [`WorkspaceStore::write`], against the same tables the
//! mutation is applied to, so check and write cannot be interleaved with another writer.

pub mod in_memory;
pub mod tables;

use std::sync::Arc;

use thiserror::Error;

pub use in_memory::InMemoryWorkspaceStore;
pub use tables::{CascadeReport, Table, Tables};

/// Storage operation error.
///
/// Infrastructure failures, as opposed to authorization or domain failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key already exists (e.g. second membership for the same user/entity).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A row references a parent that does not exist.
    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    /// The backend could not complete the transaction; nothing was applied.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend for the workspace graph.
///
/// Implementations must:
/// - give `read` closures a snapshot no concurrent writer can change mid-read
/// - serialize `write` closures and apply their changes only when they return `Ok`
pub trait WorkspaceStore: Send + Sync {
    /// Run `f` against one consistent snapshot.
    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError>;

    /// Run `f` as one serialized transaction. Commits iff `f` returns `Ok`.
    fn write<T, E>(&self, f: impl FnOnce(&mut Tables) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>;
}

impl<S> WorkspaceStore for Arc<S>
where
    S: WorkspaceStore + ?Sized,
{
    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        (**self).read(f)
    }

    fn write<T, E>(&self, f: impl FnOnce(&mut Tables) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        (**self).write(f)
    }
}
