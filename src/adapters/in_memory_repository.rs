//! In-memory policy repository for testing.
//!
//! Keeps serialized tables in a shared map instead of on disk, and counts
//! saves so tests can check checkpoint cadence.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{Result, agent::ValueTable, error::Error, ports::PolicyRepository};

/// In-memory repository for testing.
///
/// All clones share the same underlying storage.
///
/// # Examples
///
/// ```
/// use pinball_bot::adapters::InMemoryRepository;
/// use pinball_bot::agent::ValueTable;
/// use pinball_bot::ports::PolicyRepository;
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// repo.save(&ValueTable::new(), Path::new("policy"))?;
/// assert_eq!(repo.saves(), 1);
/// let loaded = repo.load(Path::new("policy"))?;
/// assert!(loaded.is_empty());
/// # Ok::<(), pinball_bot::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, ValueTable>>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save calls so far.
    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of distinct paths stored.
    pub fn count(&self) -> usize {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn path_key(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }
}

impl PolicyRepository for InMemoryRepository {
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()> {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Self::path_key(path), table.clone());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<ValueTable> {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&Self::path_key(path))
            .cloned()
            .ok_or_else(|| Error::Io {
                operation: format!("load policy from memory {path:?}"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "policy not found"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Action, StateKey};

    #[test]
    fn test_roundtrip_and_counts() {
        let repo = InMemoryRepository::new();
        let mut table = ValueTable::new();
        let (index, _) = table.find_or_insert(StateKey::from_buckets(1, 1, 0, 0));
        table.set_value(index, Action::EnableRightFlipper, 0.75);

        repo.save(&table, Path::new("a")).unwrap();
        repo.save(&table, Path::new("a")).unwrap();

        assert_eq!(repo.saves(), 2);
        assert_eq!(repo.count(), 1);
        assert_eq!(repo.load(Path::new("a")).unwrap(), table);
    }

    #[test]
    fn test_missing_path_is_error() {
        let repo = InMemoryRepository::new();
        assert!(repo.load(Path::new("missing")).is_err());
    }

    #[test]
    fn test_clones_share_storage() {
        let repo = InMemoryRepository::new();
        let clone = repo.clone();
        clone.save(&ValueTable::new(), Path::new("shared")).unwrap();
        assert_eq!(repo.count(), 1);
    }
}
