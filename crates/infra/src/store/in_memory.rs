use std::sync::RwLock;

use super::{StoreError, Tables, WorkspaceStore};

/// In-memory workspace store.
///
/// Intended for tests/dev. Each write runs against a staged copy of the tables and
/// swaps it in on success, so a failing closure leaves no trace. Staging is shallow:
/// only tables the closure mutates get copied.
#[derive(Debug, Default)]
pub struct InMemoryWorkspaceStore {
    tables: RwLock<Tables>,
}

impl InMemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl WorkspaceStore for InMemoryWorkspaceStore {
    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(f(&tables))
    }

    fn write<T, E>(&self, f: impl FnOnce(&mut Tables) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let mut staged = tables.clone();
        let out = f(&mut staged)?;
        *tables = staged;
        Ok(out)
    }
}
